//! Message header

use super::fields::{insert_ordered, set_text_at, text_at, HEADER_ORDER};
use crate::core::node::Element;
use serde::{Deserialize, Serialize};

/// A party named in the header (sender, recipient, on-behalf-of)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParty {
    /// DDEX party id
    pub party_id: Option<String>,
    /// Full name
    pub name: Option<String>,
}

impl HeaderParty {
    fn from_element(element: &Element) -> Self {
        Self {
            party_id: text_at(element, &["PartyId"]).map(str::to_string),
            name: text_at(element, &["PartyName", "FullName"]).map(str::to_string),
        }
    }

    fn to_element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        if let Some(id) = &self.party_id {
            element.children.push(Element::text_element(None, "PartyId", id.as_str()).into());
        }
        if let Some(full) = &self.name {
            element.children.push(
                Element::new("PartyName")
                    .with_child(Element::text_element(None, "FullName", full.as_str()))
                    .into(),
            );
        }
        element
    }
}

/// `MessageHeader` of a release notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    element: Element,
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self::new()
    }
}

element_access!(MessageHeader);

impl MessageHeader {
    /// Create an empty header
    pub fn new() -> Self {
        Self {
            element: Element::new("MessageHeader"),
        }
    }

    /// Wrap a parsed `MessageHeader` element
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    pub fn message_id(&self) -> Option<&str> {
        text_at(&self.element, &["MessageId"])
    }

    pub fn set_message_id(&mut self, id: impl AsRef<str>) {
        set_text_at(&mut self.element, &["MessageId"], id.as_ref(), HEADER_ORDER);
    }

    pub fn thread_id(&self) -> Option<&str> {
        text_at(&self.element, &["MessageThreadId"])
    }

    pub fn set_thread_id(&mut self, id: impl AsRef<str>) {
        set_text_at(&mut self.element, &["MessageThreadId"], id.as_ref(), HEADER_ORDER);
    }

    /// `MessageCreatedDateTime`, exactly as written
    ///
    /// Never filled in implicitly; builds stay reproducible unless the caller
    /// sets a time.
    pub fn created(&self) -> Option<&str> {
        text_at(&self.element, &["MessageCreatedDateTime"])
    }

    pub fn set_created(&mut self, date_time: impl AsRef<str>) {
        set_text_at(
            &mut self.element,
            &["MessageCreatedDateTime"],
            date_time.as_ref(),
            HEADER_ORDER,
        );
    }

    pub fn control_type(&self) -> Option<&str> {
        text_at(&self.element, &["MessageControlType"])
    }

    pub fn set_control_type(&mut self, control_type: impl AsRef<str>) {
        set_text_at(
            &mut self.element,
            &["MessageControlType"],
            control_type.as_ref(),
            HEADER_ORDER,
        );
    }

    pub fn sender(&self) -> Option<HeaderParty> {
        self.element.child("MessageSender").map(HeaderParty::from_element)
    }

    /// Replace the sender
    pub fn set_sender(&mut self, party_id: impl Into<String>, name: impl Into<String>) {
        let sender = HeaderParty {
            party_id: Some(party_id.into()),
            name: Some(name.into()),
        };
        self.element
            .children
            .retain(|n| !matches!(n.as_element(), Some(e) if e.local_name == "MessageSender"));
        insert_ordered(
            &mut self.element,
            sender.to_element("MessageSender"),
            HEADER_ORDER,
        );
    }

    pub fn recipients(&self) -> Vec<HeaderParty> {
        self.element
            .children_named("MessageRecipient")
            .map(HeaderParty::from_element)
            .collect()
    }

    /// Append a recipient after any existing ones
    pub fn add_recipient(&mut self, party_id: impl Into<String>, name: impl Into<String>) {
        let recipient = HeaderParty {
            party_id: Some(party_id.into()),
            name: Some(name.into()),
        };
        insert_ordered(
            &mut self.element,
            recipient.to_element("MessageRecipient"),
            HEADER_ORDER,
        );
    }
}
