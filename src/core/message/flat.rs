//! Flat, denormalized view of a message for reporting
//!
//! The flat view resolves references once and copies the values it needs.
//! It is one-way: there is no path back to a message.

use super::StructuredMessage;
use crate::core::error::ParseWarning;
use crate::core::version::SchemaVersion;
use serde::Serialize;

/// A message flattened to releases with their tracks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatMessage {
    pub version: SchemaVersion,
    pub message_id: Option<String>,
    pub sender: Option<String>,
    pub created: Option<String>,
    pub releases: Vec<FlatRelease>,
    pub deals: Vec<FlatDeal>,
    pub stats: MessageStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRelease {
    pub reference: Option<String>,
    pub title: Option<String>,
    pub release_type: Option<String>,
    pub icpn: Option<String>,
    pub display_artists: Vec<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub tracks: Vec<FlatTrack>,
}

/// One resource of a release, in track order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatTrack {
    /// 1-based position in the release
    pub position: usize,
    pub resource_reference: String,
    /// Whether the reference points at a resource of the message
    pub resolved: bool,
    pub isrc: Option<String>,
    pub title: Option<String>,
    pub display_artists: Vec<String>,
    pub duration: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// One `Deal` with the releases of its `ReleaseDeal`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatDeal {
    pub release_references: Vec<String>,
    pub commercial_model_types: Vec<String>,
    pub use_types: Vec<String>,
    pub territories: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageStats {
    pub party_count: usize,
    pub resource_count: usize,
    pub release_count: usize,
    pub deal_count: usize,
    pub extension_count: usize,
    pub dangling_reference_count: usize,
    /// Sum of the parseable resource durations
    pub total_duration_seconds: f64,
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

impl FlatMessage {
    pub fn from_message(message: &StructuredMessage) -> Self {
        let releases = message
            .releases
            .iter()
            .map(|release| FlatRelease {
                reference: release.reference().map(str::to_string),
                title: release.title().map(str::to_string),
                release_type: release.release_type().map(str::to_string),
                icpn: release.icpn().map(str::to_string),
                display_artists: owned(release.display_artists()),
                genres: owned(release.genres()),
                release_date: release.release_date().map(str::to_string),
                tracks: message
                    .release_tracks(release)
                    .into_iter()
                    .enumerate()
                    .map(|(i, (reference, resource))| FlatTrack {
                        position: i + 1,
                        resource_reference: reference.to_string(),
                        resolved: resource.is_some(),
                        isrc: resource.and_then(|r| r.isrc()).map(str::to_string),
                        title: resource.and_then(|r| r.title()).map(str::to_string),
                        display_artists: resource
                            .map(|r| owned(r.display_artists()))
                            .unwrap_or_default(),
                        duration: resource.and_then(|r| r.duration()).map(str::to_string),
                        duration_seconds: resource.and_then(|r| r.duration_seconds()),
                    })
                    .collect(),
            })
            .collect();

        let deals = message
            .deals
            .iter()
            .flat_map(|deal| {
                let references = owned(deal.release_references());
                deal.terms().into_iter().map(move |terms| FlatDeal {
                    release_references: references.clone(),
                    commercial_model_types: terms.commercial_model_types,
                    use_types: terms.use_types,
                    territories: terms.territories,
                    start_date: terms.start_date,
                    end_date: terms.end_date,
                })
            })
            .collect();

        let stats = MessageStats {
            party_count: message.parties.len(),
            resource_count: message.resources.len(),
            release_count: message.releases.len(),
            deal_count: message.deals.len(),
            extension_count: message.extensions.len(),
            dangling_reference_count: message
                .warnings()
                .iter()
                .filter(|w| matches!(w, ParseWarning::DanglingReference { .. }))
                .count(),
            total_duration_seconds: message
                .resources
                .iter()
                .filter_map(|r| r.duration_seconds())
                .sum(),
        };

        Self {
            version: message.version(),
            message_id: message.header.message_id().map(str::to_string),
            sender: message.header.sender().and_then(|s| s.name.or(s.party_id)),
            created: message.header.created().map(str::to_string),
            releases,
            deals,
            stats,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
