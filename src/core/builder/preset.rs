//! Message profiles with their own required fields

use crate::core::message::{ResourceKind, StructuredMessage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of product a message describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    AudioAlbum,
    AudioSingle,
    VideoSingle,
    Compilation,
}

impl Preset {
    /// `MessageControlType` written when the header has none
    pub fn default_control_type(&self) -> &'static str {
        "LiveMessage"
    }

    /// Resource kind every release must contain
    fn primary_kind(&self) -> ResourceKind {
        match self {
            Self::VideoSingle => ResourceKind::Video,
            Self::AudioAlbum | Self::AudioSingle | Self::Compilation => {
                ResourceKind::SoundRecording
            }
        }
    }

    fn min_primary_resources(&self) -> usize {
        match self {
            Self::Compilation => 2,
            _ => 1,
        }
    }

    /// Fields this profile requires that `message` lacks
    pub fn missing_fields(&self, message: &StructuredMessage) -> Vec<String> {
        let mut missing = Vec::new();
        let kind = self.primary_kind();
        let primary: Vec<_> = message
            .resources
            .iter()
            .filter(|resource| resource.kind() == kind)
            .collect();
        if primary.len() < self.min_primary_resources() {
            missing.push(format!(
                "{} {} resource(s)",
                self.min_primary_resources(),
                kind.element_name()
            ));
        }
        for resource in &primary {
            if resource.isrc().is_none() {
                missing.push(format!(
                    "{} {} ISRC",
                    kind.element_name(),
                    resource.reference().unwrap_or("?")
                ));
            }
        }
        if message.releases.is_empty() {
            missing.push("Release".to_string());
        }
        for release in &message.releases {
            if release.is_track_release() {
                continue;
            }
            let reference = release.reference().unwrap_or("?");
            if release.icpn().is_none() && release.grid().is_none() {
                missing.push(format!("Release {} ICPN", reference));
            }
            if release.title().is_none() {
                missing.push(format!("Release {} title", reference));
            }
        }
        if matches!(self, Self::AudioAlbum | Self::Compilation) && message.deals.is_empty() {
            missing.push("ReleaseDeal".to_string());
        }
        missing
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AudioAlbum => "audio_album",
            Self::AudioSingle => "audio_single",
            Self::VideoSingle => "video_single",
            Self::Compilation => "compilation",
        };
        f.write_str(name)
    }
}
