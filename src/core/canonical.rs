//! Canonical form
//!
//! Canonicalization defines when two ERN documents are the same: both are
//! reduced to one byte form and compared by SHA-256 digest. The rules are:
//!
//! 1. comments, processing instructions and the DOCTYPE are dropped;
//! 2. whitespace-only text between elements is dropped, leaf text is kept;
//! 3. `ReleaseDeal`s in a `DealList` are ordered by release reference and
//!    `Deal`s in a `ReleaseDeal` by start date, within the positions the group
//!    already occupies; nothing else moves;
//! 4. prefixes come from a fixed table (`ern`, `avs`, `xsi`, `xml`) and
//!    `ext0`, `ext1`, ... in document order for everything else;
//! 5. the serializer's fixed layout applies (see [`XmlSerializer`]).
//!
//! The builder runs the same transform before writing, so its output is
//! already canonical.

use crate::core::error::ErnResult;
use crate::core::namespace::NamespaceStrategy;
use crate::core::node::{Element, Node};
use crate::core::parser::{DomParser, ParseLimits};
use crate::core::serializer::XmlSerializer;
use crate::core::version::SchemaVersion;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic byte form of a document with its digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalForm {
    #[serde(skip)]
    content: Vec<u8>,
    #[serde(serialize_with = "hex_digest")]
    digest: [u8; 32],
    element_count: usize,
    namespace_count: usize,
}

fn hex_digest<S: serde::Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(digest))
}

impl CanonicalForm {
    pub(crate) fn new(content: Vec<u8>, element_count: usize, namespace_count: usize) -> Self {
        let digest = sha256(&content);
        Self {
            content,
            digest,
            element_count,
            namespace_count,
        }
    }

    /// Canonical bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Canonical text
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.content).unwrap_or_default()
    }

    /// Consume into the canonical bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.content
    }

    /// SHA-256 of the canonical bytes
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Lowercase hex SHA-256 of the canonical bytes
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Number of declared namespaces
    pub fn namespace_count(&self) -> usize {
        self.namespace_count
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 of a byte string
pub(crate) fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Canonicalize a document with default limits
pub fn canonicalize(input: &[u8]) -> ErnResult<CanonicalForm> {
    canonicalize_with_limits(input, ParseLimits::default())
}

/// Canonicalize a document with explicit limits
pub fn canonicalize_with_limits(input: &[u8], limits: ParseLimits) -> ErnResult<CanonicalForm> {
    let mut document = DomParser::with_limits(limits).parse(input)?;
    let active = active_namespace(&document.root);
    canonical_transform(&mut document.root, active.as_deref(), true);
    let form = canonical_form(&document.root, active.as_deref(), NamespaceStrategy::Locked)?;
    tracing::debug!(
        elements = form.element_count,
        namespaces = form.namespace_count,
        digest = %form.digest_hex(),
        "canonicalized document"
    );
    Ok(form)
}

/// The root namespace when it is a supported ERN schema
pub(crate) fn active_namespace(root: &Element) -> Option<String> {
    root.namespace
        .as_deref()
        .filter(|uri| SchemaVersion::from_namespace(uri).is_some())
        .map(str::to_string)
}

/// Serialize an already transformed tree into its canonical form
pub(crate) fn canonical_form(
    root: &Element,
    active: Option<&str>,
    strategy: NamespaceStrategy,
) -> ErnResult<CanonicalForm> {
    let xml = XmlSerializer::new(strategy).document(root, active, &[])?;
    Ok(CanonicalForm::new(
        xml.bytes,
        xml.element_count,
        xml.namespace_count,
    ))
}

/// Apply the tree rules (comments, whitespace and, with `reorder`, deal order)
pub(crate) fn canonical_transform(root: &mut Element, active: Option<&str>, reorder: bool) {
    root.take_comments();
    root.strip_insignificant_whitespace();
    if reorder {
        reorder_unordered(root, active);
    }
}

fn is_schema_element(element: &Element, active: Option<&str>) -> bool {
    !element.is_extension && (element.namespace.is_none() || element.namespace.as_deref() == active)
}

/// Extension subtrees are opaque and keep their order
fn reorder_unordered(element: &mut Element, active: Option<&str>) {
    if !is_schema_element(element, active) {
        return;
    }
    match element.local_name.as_str() {
        "DealList" => reorder_slots(element, "ReleaseDeal", active, release_deal_key),
        "ReleaseDeal" => reorder_slots(element, "Deal", active, deal_key),
        _ => {}
    }
    for child in element.child_elements_mut() {
        reorder_unordered(child, active);
    }
}

/// Stable-sort the children named `name` among the positions they occupy
fn reorder_slots(
    element: &mut Element,
    name: &str,
    active: Option<&str>,
    key: fn(&Element) -> String,
) {
    let slots: Vec<usize> = element
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            matches!(node, Node::Element(e) if e.local_name == name && is_schema_element(e, active))
        })
        .map(|(i, _)| i)
        .collect();
    if slots.len() < 2 {
        return;
    }
    let mut group: Vec<(String, Node)> = slots
        .iter()
        .map(|&i| {
            let node = std::mem::replace(&mut element.children[i], Node::Text(String::new()));
            let sort_key = node.as_element().map(key).unwrap_or_default();
            (sort_key, node)
        })
        .collect();
    group.sort_by(|a, b| a.0.cmp(&b.0));
    for (slot, (_, node)) in slots.into_iter().zip(group) {
        element.children[slot] = node;
    }
}

/// `ReleaseDeal` key: its release references in document order
pub(crate) fn release_deal_key(release_deal: &Element) -> String {
    release_deal
        .children_named("DealReleaseReference")
        .filter_map(Element::text)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Deal` key: start of validity, falling back to the effective date
pub(crate) fn deal_key(deal: &Element) -> String {
    deal.descendants_named("ValidityPeriod")
        .into_iter()
        .find_map(|period| {
            period
                .child("StartDate")
                .or_else(|| period.child("StartDateTime"))
                .and_then(Element::text)
        })
        .or_else(|| {
            deal.descendants_named("EffectiveDate")
                .into_iter()
                .next()
                .and_then(Element::text)
        })
        .map(|date| date.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attribute_order_irrelevant() {
        let a = br#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" MessageSchemaVersionId="ern/43" LanguageAndScriptCode="en"><MessageHeader/></ern:NewReleaseMessage>"#;
        let b = br#"<ern:NewReleaseMessage LanguageAndScriptCode="en" xmlns:ern="http://ddex.net/xml/ern/43" MessageSchemaVersionId="ern/43"><MessageHeader></MessageHeader></ern:NewReleaseMessage>"#;
        let ca = canonicalize(a).unwrap();
        let cb = canonicalize(b).unwrap();
        assert_eq!(ca.as_str(), cb.as_str());
        assert_eq!(ca.digest(), cb.digest());
        assert_eq!(ca.element_count(), 2);
        assert_eq!(ca.namespace_count(), 1);
    }

    #[test]
    fn test_prefix_choice_irrelevant() {
        let a = br#"<x:NewReleaseMessage xmlns:x="http://ddex.net/xml/ern/43" xmlns:sp="urn:spotify"><sp:Tag>1</sp:Tag></x:NewReleaseMessage>"#;
        let b = br#"<NewReleaseMessage xmlns="http://ddex.net/xml/ern/43"><q:Tag xmlns:q="urn:spotify">1</q:Tag></NewReleaseMessage>"#;
        let ca = canonicalize(a).unwrap();
        assert_eq!(ca.as_str(), canonicalize(b).unwrap().as_str());
        assert!(ca.as_str().contains("<ext0:Tag>1</ext0:Tag>"));
    }

    #[test]
    fn test_idempotent() {
        let input = br#"<?xml version="1.0"?>
<!DOCTYPE x>
<!-- generated -->
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43">
  <MessageHeader>
    <MessageId> spaced </MessageId>
    <Note>a &amp; b<![CDATA[ <c> ]]></Note>
  </MessageHeader>
</ern:NewReleaseMessage>"#;
        let once = canonicalize(input).unwrap();
        let twice = canonicalize(once.as_bytes()).unwrap();
        assert_eq!(once.as_str(), twice.as_str());
        assert!(once.as_str().contains("<MessageId> spaced </MessageId>"));
        assert!(!once.as_str().contains("generated"));
    }

    #[test]
    fn test_deals_reordered_within_slots() {
        let input = br#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43"><DealList>
<ReleaseDeal><DealReleaseReference>R2</DealReleaseReference>
  <Deal><DealTerms><ValidityPeriod><StartDate>2024-05-01</StartDate></ValidityPeriod></DealTerms></Deal>
  <Deal><DealTerms><ValidityPeriod><StartDate>2023-01-01</StartDate></ValidityPeriod></DealTerms></Deal>
</ReleaseDeal>
<ReleaseDeal><DealReleaseReference>R1</DealReleaseReference></ReleaseDeal>
</DealList></ern:NewReleaseMessage>"#;
        let text = canonicalize(input).unwrap().as_str().to_string();
        let r1 = text.find("R1").unwrap();
        let r2 = text.find("R2").unwrap();
        assert!(r1 < r2);
        assert!(text.find("2023-01-01").unwrap() < text.find("2024-05-01").unwrap());
    }

    #[test]
    fn test_extension_subtree_not_reordered() {
        let input = br#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:x="urn:x"><x:Archive><DealList>
<ReleaseDeal><DealReleaseReference>R2</DealReleaseReference></ReleaseDeal>
<ReleaseDeal><DealReleaseReference>R1</DealReleaseReference></ReleaseDeal>
</DealList></x:Archive></ern:NewReleaseMessage>"#;
        let text = canonicalize(input).unwrap().as_str().to_string();
        assert!(text.find("R2").unwrap() < text.find("R1").unwrap());
    }

    #[test]
    fn test_track_order_preserved() {
        let input = br#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43"><ResourceList>
<SoundRecording><ResourceReference>A2</ResourceReference></SoundRecording>
<SoundRecording><ResourceReference>A1</ResourceReference></SoundRecording>
</ResourceList></ern:NewReleaseMessage>"#;
        let text = canonicalize(input).unwrap().as_str().to_string();
        assert!(text.find("A2").unwrap() < text.find("A1").unwrap());
    }

    #[test]
    fn test_digest_hex() {
        let form = canonicalize(b"<a/>").unwrap();
        assert_eq!(form.as_str(), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>\n");
        assert_eq!(form.digest_hex(), hex::encode(sha256(form.as_bytes())));
        assert_eq!(form.digest_hex().len(), 64);
    }
}
