//! Field access helpers shared by the entity types
//!
//! Entities keep their element as the source of truth. Getters read through
//! local-name paths; setters create missing elements, placing new children of
//! the entity at their position in the schema's sequence.

use crate::core::node::{Element, Node};
use crate::core::version::SchemaVersion;

/// Trimmed text of the first element at `path`
pub(crate) fn text_at<'a>(element: &'a Element, path: &[&str]) -> Option<&'a str> {
    element.find(path).and_then(Element::text).map(str::trim)
}

/// Text at the first of `paths` that exists
pub(crate) fn first_text<'a>(element: &'a Element, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| text_at(element, path))
}

/// Trimmed texts of every element reachable through `path`
pub(crate) fn texts_at<'a>(element: &'a Element, path: &[&str]) -> Vec<&'a str> {
    element
        .find_all(path)
        .into_iter()
        .filter_map(Element::text)
        .map(str::trim)
        .collect()
}

/// Texts of the first of `paths` that yields anything
pub(crate) fn first_texts<'a>(element: &'a Element, paths: &[&[&str]]) -> Vec<&'a str> {
    paths
        .iter()
        .map(|path| texts_at(element, path))
        .find(|texts| !texts.is_empty())
        .unwrap_or_default()
}

/// Insert `child` before the first existing child that comes later in `order`
///
/// Children missing from `order` sort last. Returns the node index used.
pub(crate) fn insert_ordered(parent: &mut Element, child: Element, order: &[&str]) -> usize {
    let rank = |name: &str| order.iter().position(|o| *o == name).unwrap_or(usize::MAX);
    let child_rank = rank(&child.local_name);
    let index = parent
        .children
        .iter()
        .position(|node| match node {
            Node::Element(e) => !e.is_extension && rank(&e.local_name) > child_rank,
            _ => false,
        })
        .unwrap_or(parent.children.len());
    parent.children.insert(index, Node::Element(child));
    index
}

/// Set the text at `path`, creating missing elements on the way
///
/// `order` positions a newly created first-level child.
pub(crate) fn set_text_at(element: &mut Element, path: &[&str], value: &str, order: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        element.set_text(value);
        return;
    };
    let existing = element
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.local_name == *first));
    let index = match existing {
        Some(i) => i,
        None => insert_ordered(element, Element::new(*first), order),
    };
    if let Some(Node::Element(child)) = element.children.get_mut(index) {
        set_text_at(child, rest, value, &[]);
    }
}

/// Mutable first child named `name`, created at its schema position if missing
pub(crate) fn child_or_insert<'a>(
    element: &'a mut Element,
    name: &str,
    order: &[&str],
) -> Option<&'a mut Element> {
    if element.child(name).is_none() {
        insert_ordered(element, Element::new(name), order);
    }
    element.child_mut(name)
}

pub(crate) const HEADER_ORDER: &[&str] = &[
    "MessageThreadId",
    "MessageId",
    "MessageFileName",
    "MessageSender",
    "SentOnBehalfOf",
    "MessageRecipient",
    "MessageCreatedDateTime",
    "MessageAuditTrail",
    "Comment",
    "MessageControlType",
];

pub(crate) const PARTY_ORDER: &[&str] = &["PartyReference", "PartyId", "PartyName"];

const RESOURCE_ORDER_4X: &[&str] = &[
    "ResourceReference",
    "Type",
    "ResourceId",
    "WorkId",
    "DisplayTitleText",
    "DisplayTitle",
    "VersionType",
    "DisplayArtistName",
    "DisplayArtist",
    "Contributor",
    "Character",
    "ResourceRightsController",
    "WorkRightsController",
    "PLine",
    "CourtesyLine",
    "Duration",
    "CreationDate",
    "MasteredDate",
    "RemasteredDate",
    "FirstPublicationDate",
    "ParentalWarningType",
    "RelatedRelease",
    "RelatedResource",
    "TechnicalDetails",
];

const SOUND_RECORDING_ORDER_382: &[&str] = &[
    "SoundRecordingType",
    "IsArtistRelated",
    "SoundRecordingId",
    "IndirectSoundRecordingId",
    "ResourceReference",
    "ReferenceTitle",
    "InstrumentationDescription",
    "IsRemastered",
    "IsMedley",
    "IsPotpourri",
    "IsInstrumental",
    "IsBackground",
    "IsHiddenResource",
    "IsBonusResource",
    "IsComputerGenerated",
    "NoSilenceBefore",
    "NoSilenceAfter",
    "PerformerInformationRequired",
    "LanguageOfPerformance",
    "Duration",
    "RightsAgreementId",
    "SoundRecordingCollectionReferenceList",
    "CreationDate",
    "MasteredDate",
    "SoundRecordingDetailsByTerritory",
];

const VIDEO_ORDER_382: &[&str] = &[
    "VideoType",
    "IsArtistRelated",
    "VideoId",
    "IndirectVideoId",
    "ResourceReference",
    "VideoCueSheetReference",
    "ReasonForCueSheetAbsence",
    "ReferenceTitle",
    "Duration",
    "RightsAgreementId",
    "VideoCollectionReferenceList",
    "CreationDate",
    "VideoDetailsByTerritory",
];

const GENERIC_ORDER_382: &[&str] = &["ResourceReference", "ReferenceTitle", "Duration"];

/// Child order of a resource element
pub(crate) fn resource_order(kind: &str, version: SchemaVersion) -> &'static [&'static str] {
    match (version.is_4x(), kind) {
        (true, _) => RESOURCE_ORDER_4X,
        (false, "SoundRecording") => SOUND_RECORDING_ORDER_382,
        (false, "Video") => VIDEO_ORDER_382,
        (false, _) => GENERIC_ORDER_382,
    }
}

const RELEASE_ORDER_4X: &[&str] = &[
    "ReleaseReference",
    "ReleaseType",
    "ReleaseId",
    "DisplayTitleText",
    "DisplayTitle",
    "AdditionalTitle",
    "DisplayArtistName",
    "DisplayArtist",
    "ReleaseLabelReference",
    "AdministratingRecordCompany",
    "PLine",
    "CLine",
    "CourtesyLine",
    "Duration",
    "Genre",
    "ReleaseDate",
    "OriginalReleaseDate",
    "OriginalDigitalReleaseDate",
    "ParentalWarningType",
    "AvRating",
    "RelatedRelease",
    "RelatedResource",
    "ResourceGroup",
    "ExternalResourceLink",
    "Keywords",
    "Synopsis",
];

const RELEASE_ORDER_382: &[&str] = &[
    "ReleaseId",
    "ReleaseReference",
    "ExternalResourceLink",
    "SalesReportingProxyReleaseId",
    "ReferenceTitle",
    "ReleaseResourceReferenceList",
    "ReleaseCollectionReferenceList",
    "ReleaseType",
    "ReleaseDetailsByTerritory",
    "LanguageOfPerformance",
    "Duration",
    "RightsAgreementId",
    "PLine",
    "CLine",
    "ReleaseDate",
    "OriginalReleaseDate",
    "GlobalReleaseDate",
    "GlobalOriginalReleaseDate",
];

/// Child order of a release element
pub(crate) fn release_order(version: SchemaVersion) -> &'static [&'static str] {
    if version.is_4x() {
        RELEASE_ORDER_4X
    } else {
        RELEASE_ORDER_382
    }
}

pub(crate) const RELEASE_DEAL_ORDER: &[&str] = &["DealReleaseReference", "Deal", "EffectiveDate"];

/// Child order of `DealTerms`
pub(crate) fn deal_terms_order(version: SchemaVersion) -> &'static [&'static str] {
    if version.is_4x() {
        &[
            "TerritoryCode",
            "ExcludedTerritoryCode",
            "DistributionChannel",
            "ValidityPeriod",
            "CommercialModelType",
            "UseType",
        ]
    } else {
        &[
            "CommercialModelType",
            "Usage",
            "TerritoryCode",
            "ExcludedTerritoryCode",
            "ValidityPeriod",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_ordered() {
        let mut release = Element::new("Release")
            .with_child(Element::text_element(None, "ReleaseReference", "R1"))
            .with_child(Element::text_element(None, "Genre", "Pop"));
        set_text_at(
            &mut release,
            &["DisplayTitleText"],
            "Album",
            release_order(SchemaVersion::Ern43),
        );
        set_text_at(
            &mut release,
            &["ReleaseId", "ICPN"],
            "0123456789012",
            release_order(SchemaVersion::Ern43),
        );
        let names: Vec<_> = release.child_elements().map(|e| e.local_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ReleaseReference", "ReleaseId", "DisplayTitleText", "Genre"]
        );
        assert_eq!(text_at(&release, &["ReleaseId", "ICPN"]), Some("0123456789012"));
    }

    #[test]
    fn test_set_existing_keeps_position() {
        let mut header = Element::new("MessageHeader")
            .with_child(Element::text_element(None, "MessageId", "old"))
            .with_child(Element::text_element(None, "MessageCreatedDateTime", "x"));
        set_text_at(&mut header, &["MessageId"], "new", HEADER_ORDER);
        assert_eq!(header.children.len(), 2);
        assert_eq!(text_at(&header, &["MessageId"]), Some("new"));
    }

    #[test]
    fn test_first_texts() {
        let release = Element::new("Release").with_child(
            Element::new("ReleaseDetailsByTerritory")
                .with_child(Element::text_element(None, "DisplayArtistName", "A"))
                .with_child(Element::text_element(None, "DisplayArtistName", "B")),
        );
        let names = first_texts(
            &release,
            &[
                &["DisplayArtistName"],
                &["ReleaseDetailsByTerritory", "DisplayArtistName"],
            ],
        );
        assert_eq!(names, vec!["A", "B"]);
    }
}
