//! Resources of the `ResourceList`
//!
//! A resource is one element of the `ResourceList` (`SoundRecording`, `Video`,
//! `Image`, ...). Field locations differ between 3.8.2 and 4.x; the getters
//! read both layouts and the setters write the layout of the message version.

use super::fields::{
    child_or_insert, first_text, first_texts, insert_ordered, resource_order, set_text_at,
    text_at, texts_at,
};
use crate::core::node::Element;
use crate::core::version::SchemaVersion;
use crate::utils::duration::duration_seconds;
use serde::{Deserialize, Serialize};

/// Kind of resource, named by its element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    SoundRecording,
    Video,
    Image,
    Text,
    SheetMusic,
    Software,
    /// Any other resource element
    Other(String),
}

impl ResourceKind {
    /// Kind for a resource element name
    pub fn from_name(name: &str) -> Self {
        match name {
            "SoundRecording" => Self::SoundRecording,
            "Video" => Self::Video,
            "Image" => Self::Image,
            "Text" => Self::Text,
            "SheetMusic" => Self::SheetMusic,
            "Software" => Self::Software,
            other => Self::Other(other.to_string()),
        }
    }

    /// Element name of this kind
    pub fn element_name(&self) -> &str {
        match self {
            Self::SoundRecording => "SoundRecording",
            Self::Video => "Video",
            Self::Image => "Image",
            Self::Text => "Text",
            Self::SheetMusic => "SheetMusic",
            Self::Software => "Software",
            Self::Other(name) => name,
        }
    }
}

/// A resource entity keyed by `ResourceReference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    element: Element,
    version: SchemaVersion,
}

element_access!(Resource);

impl Resource {
    /// Create a resource of `kind` with its reference
    pub fn new(kind: ResourceKind, reference: impl AsRef<str>, version: SchemaVersion) -> Self {
        let mut resource = Self {
            element: Element::new(kind.element_name()),
            version,
        };
        resource.set_reference(reference);
        resource
    }

    /// Wrap a parsed resource element
    pub fn from_element(element: Element, version: SchemaVersion) -> Self {
        Self { element, version }
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from_name(&self.element.local_name)
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    fn order(&self) -> &'static [&'static str] {
        resource_order(&self.element.local_name, self.version)
    }

    /// Name of the 3.8.2 per-kind child such as `SoundRecordingId`
    fn kind_child(&self, suffix: &str) -> String {
        format!("{}{}", self.element.local_name, suffix)
    }

    pub fn reference(&self) -> Option<&str> {
        text_at(&self.element, &["ResourceReference"])
    }

    pub fn set_reference(&mut self, reference: impl AsRef<str>) {
        let order = self.order();
        set_text_at(&mut self.element, &["ResourceReference"], reference.as_ref(), order);
    }

    /// `Type` (4.x) or `SoundRecordingType`-style child (3.8.2)
    pub fn resource_type(&self) -> Option<&str> {
        let legacy = self.kind_child("Type");
        first_text(&self.element, &[&["Type"], &[legacy.as_str()]])
    }

    pub fn set_resource_type(&mut self, value: impl AsRef<str>) {
        let name = if self.version.is_4x() {
            "Type".to_string()
        } else {
            self.kind_child("Type")
        };
        let order = self.order();
        set_text_at(&mut self.element, &[name.as_str()], value.as_ref(), order);
    }

    /// ISRC from whichever id container the message uses
    pub fn isrc(&self) -> Option<&str> {
        first_text(
            &self.element,
            &[
                &["ResourceId", "ISRC"],
                &["SoundRecordingId", "ISRC"],
                &["VideoId", "ISRC"],
                &["ISRC"],
            ],
        )
    }

    pub fn set_isrc(&mut self, isrc: impl AsRef<str>) {
        let container = if self.version.is_4x() {
            "ResourceId".to_string()
        } else {
            self.kind_child("Id")
        };
        let order = self.order();
        set_text_at(
            &mut self.element,
            &[container.as_str(), "ISRC"],
            isrc.as_ref(),
            order,
        );
    }

    /// Display title
    pub fn title(&self) -> Option<&str> {
        let by_territory = self.kind_child("DetailsByTerritory");
        first_text(
            &self.element,
            &[
                &["DisplayTitleText"],
                &["DisplayTitle", "TitleText"],
                &["ReferenceTitle", "TitleText"],
                &[by_territory.as_str(), "Title", "TitleText"],
            ],
        )
    }

    pub fn set_title(&mut self, title: impl AsRef<str>) {
        let path: &[&str] = if self.version.is_4x() {
            &["DisplayTitleText"]
        } else {
            &["ReferenceTitle", "TitleText"]
        };
        let order = self.order();
        set_text_at(&mut self.element, path, title.as_ref(), order);
    }

    /// Display artist names, in document order
    pub fn display_artists(&self) -> Vec<&str> {
        let by_territory = self.kind_child("DetailsByTerritory");
        first_texts(
            &self.element,
            &[
                &["DisplayArtistName"],
                &["DisplayArtist", "PartyName", "FullName"],
                &[by_territory.as_str(), "DisplayArtistName"],
                &[by_territory.as_str(), "DisplayArtist", "PartyName", "FullName"],
            ],
        )
    }

    /// Append a display artist name
    pub fn add_display_artist(&mut self, name: impl Into<String>) {
        let name = name.into();
        let order = self.order();
        if self.version.is_4x() {
            insert_ordered(
                &mut self.element,
                Element::text_element(None, "DisplayArtistName", name),
                order,
            );
        } else {
            let by_territory = self.kind_child("DetailsByTerritory");
            let Some(details) = child_or_insert(&mut self.element, &by_territory, order) else {
                return;
            };
            if details.child("TerritoryCode").is_none() {
                details
                    .children
                    .insert(0, Element::text_element(None, "TerritoryCode", "Worldwide").into());
            }
            details.children.push(
                Element::new("DisplayArtist")
                    .with_child(
                        Element::new("PartyName")
                            .with_child(Element::text_element(None, "FullName", name)),
                    )
                    .into(),
            );
        }
    }

    /// `ArtistPartyReference`s of display artists and contributors
    pub fn artist_party_references(&self) -> Vec<&str> {
        let mut references = texts_at(&self.element, &["DisplayArtist", "ArtistPartyReference"]);
        references.extend(texts_at(
            &self.element,
            &["Contributor", "ContributorPartyReference"],
        ));
        references
    }

    /// Duration text, as written
    pub fn duration(&self) -> Option<&str> {
        text_at(&self.element, &["Duration"])
    }

    pub fn set_duration(&mut self, duration: impl AsRef<str>) {
        let order = self.order();
        set_text_at(&mut self.element, &["Duration"], duration.as_ref(), order);
    }

    /// Duration in seconds, when it parses
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration().and_then(duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(resource: &Resource) -> Vec<&str> {
        resource
            .element()
            .child_elements()
            .map(|e| e.local_name.as_str())
            .collect()
    }

    #[test]
    fn test_ern43_layout() {
        let mut track = Resource::new(ResourceKind::SoundRecording, "A1", SchemaVersion::Ern43);
        track.set_duration("PT3M45S");
        track.add_display_artist("Artist");
        track.set_title("Song");
        track.set_isrc("USRC17607839");
        track.set_resource_type("MusicalWorkSoundRecording");
        assert_eq!(
            names(&track),
            vec![
                "ResourceReference",
                "Type",
                "ResourceId",
                "DisplayTitleText",
                "DisplayArtistName",
                "Duration"
            ]
        );
        assert_eq!(track.isrc(), Some("USRC17607839"));
        assert_eq!(track.title(), Some("Song"));
        assert_eq!(track.display_artists(), vec!["Artist"]);
        assert_eq!(track.duration_seconds(), Some(225.0));
    }

    #[test]
    fn test_ern382_layout() {
        let mut track = Resource::new(ResourceKind::SoundRecording, "A1", SchemaVersion::Ern382);
        track.add_display_artist("Artist");
        track.set_title("Song");
        track.set_isrc("USRC17607839");
        track.set_resource_type("MusicalWorkSoundRecording");
        assert_eq!(
            names(&track),
            vec![
                "SoundRecordingType",
                "SoundRecordingId",
                "ResourceReference",
                "ReferenceTitle",
                "SoundRecordingDetailsByTerritory"
            ]
        );
        assert_eq!(track.resource_type(), Some("MusicalWorkSoundRecording"));
        assert_eq!(track.isrc(), Some("USRC17607839"));
        assert_eq!(track.title(), Some("Song"));
        assert_eq!(track.display_artists(), vec!["Artist"]);
    }

    #[test]
    fn test_direct_isrc_child() {
        let element = Element::new("SoundRecording")
            .with_child(Element::text_element(None, "ISRC", " USRC17607839 "));
        let track = Resource::from_element(element, SchemaVersion::Ern43);
        assert_eq!(track.isrc(), Some("USRC17607839"));
        assert_eq!(track.kind(), ResourceKind::SoundRecording);
    }
}
