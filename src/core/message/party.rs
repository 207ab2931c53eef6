//! Parties of the `PartyList` (ERN 4.x)

use super::fields::{insert_ordered, set_text_at, text_at, texts_at, PARTY_ORDER};
use crate::core::node::Element;
use crate::types::{Identifier, IdentifierKind};
use serde::{Deserialize, Serialize};

/// A `Party` entity keyed by `PartyReference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    element: Element,
}

element_access!(Party);

impl Party {
    /// Create a party with a reference and a full name
    pub fn new(reference: impl AsRef<str>, full_name: impl Into<String>) -> Self {
        let mut party = Self {
            element: Element::new("Party"),
        };
        party.set_reference(reference);
        party.add_name(full_name);
        party
    }

    /// Wrap a parsed `Party` element
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    pub fn reference(&self) -> Option<&str> {
        text_at(&self.element, &["PartyReference"])
    }

    pub fn set_reference(&mut self, reference: impl AsRef<str>) {
        set_text_at(&mut self.element, &["PartyReference"], reference.as_ref(), PARTY_ORDER);
    }

    /// Full names in document order
    pub fn names(&self) -> Vec<&str> {
        texts_at(&self.element, &["PartyName", "FullName"])
    }

    /// First full name
    pub fn name(&self) -> Option<&str> {
        self.names().into_iter().next()
    }

    /// Append a `PartyName`
    pub fn add_name(&mut self, full_name: impl Into<String>) {
        let name = Element::new("PartyName")
            .with_child(Element::text_element(None, "FullName", full_name));
        insert_ordered(&mut self.element, name, PARTY_ORDER);
    }

    /// Identifiers under `PartyId` (ISNI, DPID, proprietary)
    pub fn ids(&self) -> Vec<Identifier> {
        self.element
            .children_named("PartyId")
            .flat_map(|id| {
                let nested: Vec<Identifier> = id
                    .child_elements()
                    .filter_map(|child| {
                        let value = child.text()?.trim();
                        let kind = IdentifierKind::from_element_name(&child.local_name);
                        let mut identifier = Identifier::new(kind, value);
                        identifier.namespace = child.attribute("Namespace").map(str::to_string);
                        Some(identifier)
                    })
                    .collect();
                if nested.is_empty() {
                    // 3.x style: the value sits directly in PartyId
                    id.text()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| vec![Identifier::new(IdentifierKind::Dpid, v)])
                        .unwrap_or_default()
                } else {
                    nested
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::DomParser;

    #[test]
    fn test_new_party() {
        let party = Party::new("P1", "Björk");
        assert_eq!(party.reference(), Some("P1"));
        assert_eq!(party.name(), Some("Björk"));
        let names: Vec<_> = party
            .element()
            .child_elements()
            .map(|e| e.local_name.as_str())
            .collect();
        assert_eq!(names, vec!["PartyReference", "PartyName"]);
    }

    #[test]
    fn test_party_ids() {
        let xml = br#"<Party><PartyReference>P2</PartyReference>
<PartyId><ISNI>0000000121032683</ISNI><ProprietaryId Namespace="PADPIDA1">X-9</ProprietaryId></PartyId>
<PartyName><FullName>Label</FullName></PartyName></Party>"#;
        let party = Party::from_element(DomParser::new().parse(xml).unwrap().root);
        let ids = party.ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].kind, IdentifierKind::Isni);
        assert_eq!(ids[1].kind, IdentifierKind::ProprietaryId);
        assert_eq!(ids[1].namespace.as_deref(), Some("PADPIDA1"));
    }
}
