//! Releases of the `ReleaseList`

use super::fields::{
    child_or_insert, first_text, first_texts, insert_ordered, release_order, set_text_at,
    text_at, texts_at,
};
use crate::core::node::Element;
use crate::core::version::SchemaVersion;
use serde::{Deserialize, Serialize};

/// A `Release` (or `TrackRelease`) entity keyed by `ReleaseReference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    element: Element,
    version: SchemaVersion,
}

element_access!(Release);

impl Release {
    /// Create a release with its reference
    pub fn new(reference: impl AsRef<str>, version: SchemaVersion) -> Self {
        let mut release = Self {
            element: Element::new("Release"),
            version,
        };
        release.set_reference(reference);
        release
    }

    /// Wrap a parsed release element
    pub fn from_element(element: Element, version: SchemaVersion) -> Self {
        Self { element, version }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Whether this is a 4.x `TrackRelease`
    pub fn is_track_release(&self) -> bool {
        self.element.local_name == "TrackRelease"
    }

    fn order(&self) -> &'static [&'static str] {
        release_order(self.version)
    }

    pub fn reference(&self) -> Option<&str> {
        text_at(&self.element, &["ReleaseReference"])
    }

    pub fn set_reference(&mut self, reference: impl AsRef<str>) {
        let order = self.order();
        set_text_at(
            &mut self.element,
            &["ReleaseReference"],
            reference.as_ref(),
            order,
        );
    }

    pub fn release_type(&self) -> Option<&str> {
        text_at(&self.element, &["ReleaseType"])
    }

    pub fn set_release_type(&mut self, release_type: impl AsRef<str>) {
        let order = self.order();
        set_text_at(
            &mut self.element,
            &["ReleaseType"],
            release_type.as_ref(),
            order,
        );
    }

    /// ICPN (UPC/EAN) of the release
    pub fn icpn(&self) -> Option<&str> {
        first_text(
            &self.element,
            &[&["ReleaseId", "ICPN"], &["ReleaseId", "UPC"], &["ReleaseId", "EAN"]],
        )
    }

    pub fn set_icpn(&mut self, icpn: impl AsRef<str>) {
        let order = self.order();
        set_text_at(
            &mut self.element,
            &["ReleaseId", "ICPN"],
            icpn.as_ref(),
            order,
        );
    }

    pub fn grid(&self) -> Option<&str> {
        text_at(&self.element, &["ReleaseId", "GRid"])
    }

    pub fn catalog_number(&self) -> Option<&str> {
        text_at(&self.element, &["ReleaseId", "CatalogNumber"])
    }

    /// Display title
    pub fn title(&self) -> Option<&str> {
        first_text(
            &self.element,
            &[
                &["DisplayTitleText"],
                &["DisplayTitle", "TitleText"],
                &["ReferenceTitle", "TitleText"],
                &["ReleaseDetailsByTerritory", "Title", "TitleText"],
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
        first_texts(
            &self.element,
            &[
                &["DisplayArtistName"],
                &["DisplayArtist", "PartyName", "FullName"],
                &["ReleaseDetailsByTerritory", "DisplayArtistName"],
                &["ReleaseDetailsByTerritory", "DisplayArtist", "PartyName", "FullName"],
            ],
        )
    }

    /// Append a display artist name
    pub fn add_display_artist(&mut self, name: impl Into<String>) {
        let order = self.order();
        if self.version.is_4x() {
            insert_ordered(
                &mut self.element,
                Element::text_element(None, "DisplayArtistName", name),
                order,
            );
        } else if let Some(details) =
            child_or_insert(&mut self.element, "ReleaseDetailsByTerritory", order)
        {
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

    /// `ArtistPartyReference`s of the display artists
    pub fn artist_party_references(&self) -> Vec<&str> {
        texts_at(&self.element, &["DisplayArtist", "ArtistPartyReference"])
    }

    pub fn genres(&self) -> Vec<&str> {
        first_texts(
            &self.element,
            &[
                &["Genre", "GenreText"],
                &["ReleaseDetailsByTerritory", "Genre", "GenreText"],
            ],
        )
    }

    pub fn release_date(&self) -> Option<&str> {
        first_text(
            &self.element,
            &[
                &["ReleaseDate"],
                &["OriginalReleaseDate"],
                &["GlobalOriginalReleaseDate"],
                &["ReleaseDetailsByTerritory", "ReleaseDate"],
            ],
        )
    }

    pub fn duration(&self) -> Option<&str> {
        text_at(&self.element, &["Duration"])
    }

    /// Referenced resources in document (track) order, first occurrence only
    ///
    /// Covers the 3.8.2 `ReleaseResourceReferenceList` and the 4.x
    /// `ResourceGroup` tree alike.
    pub fn resource_references(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for reference in self.element.descendants_named("ReleaseResourceReference") {
            if let Some(text) = reference.text().map(str::trim) {
                if !seen.contains(&text) {
                    seen.push(text);
                }
            }
        }
        seen
    }

    /// Append a resource as the next track
    pub fn add_resource_reference(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        let order = self.order();
        if self.version.is_4x() {
            let Some(group) = child_or_insert(&mut self.element, "ResourceGroup", order) else {
                return;
            };
            let sequence = group.children_named("ResourceGroupContentItem").count() + 1;
            group.children.push(
                Element::new("ResourceGroupContentItem")
                    .with_child(Element::text_element(
                        None,
                        "SequenceNumber",
                        sequence.to_string(),
                    ))
                    .with_child(Element::text_element(
                        None,
                        "ReleaseResourceReference",
                        reference,
                    ))
                    .into(),
            );
        } else if let Some(list) =
            child_or_insert(&mut self.element, "ReleaseResourceReferenceList", order)
        {
            list.children.push(
                Element::text_element(None, "ReleaseResourceReference", reference).into(),
            );
        }
    }
}
