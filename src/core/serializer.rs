//! XML serializer
//!
//! This module writes [`Element`] trees with the fixed layout used for every
//! output of this crate: `UTF-8` declaration, two-space indentation, all
//! namespace declarations on the root sorted by prefix, attributes sorted by
//! qualified name, self-closing empty elements and a trailing newline.

use crate::core::error::ErnResult;
use crate::core::namespace::{NamespaceStrategy, PrefixTable};
use crate::core::node::{Element, Node};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Cursor;

/// Output of a document serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedXml {
    /// UTF-8 bytes
    pub bytes: Vec<u8>,
    /// Number of elements written
    pub element_count: usize,
    /// Number of namespace declarations on the root
    pub namespace_count: usize,
}

/// Serializer for element trees
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer {
    strategy: NamespaceStrategy,
}

impl XmlSerializer {
    /// Create a serializer using `strategy` for unknown namespaces
    pub fn new(strategy: NamespaceStrategy) -> Self {
        Self { strategy }
    }

    /// Serialize a whole document
    ///
    /// `active` is the namespace that takes the `ern` prefix. `comments` are
    /// written right after the root's start tag.
    pub fn document(
        &self,
        root: &Element,
        active: Option<&str>,
        comments: &[String],
    ) -> ErnResult<SerializedXml> {
        let prefixes = self.assign_prefixes(root, active);
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut element_count = 0;
        self.write_element(&mut writer, root, &prefixes, Some(comments), &mut element_count)?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(SerializedXml {
            bytes,
            element_count,
            namespace_count: prefixes.len(),
        })
    }

    /// Serialize a subtree on its own, declaring the namespaces it uses
    pub fn fragment(&self, element: &Element, active: Option<&str>) -> ErnResult<String> {
        let prefixes = self.assign_prefixes(element, active);
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        let mut element_count = 0;
        let no_comments: &[String] = &[];
        self.write_element(&mut writer, element, &prefixes, Some(no_comments), &mut element_count)?;
        let bytes = writer.into_inner().into_inner();
        // every piece written above is a &str
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Number every namespace in pre-order: element name, then attributes by (URI, local name)
    fn assign_prefixes(&self, root: &Element, active: Option<&str>) -> PrefixTable {
        let mut table = PrefixTable::new(active, self.strategy);
        let mut stack = vec![root];
        while let Some(element) = stack.pop() {
            if let Some(uri) = &element.namespace {
                table.assign(uri, element.prefix.as_deref());
            }
            let mut attributes: Vec<_> = element
                .attributes
                .iter()
                .filter_map(|a| a.namespace.as_deref().map(|uri| (uri, &a.local_name, a)))
                .collect();
            attributes.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
            for (uri, _, attribute) in attributes {
                table.assign(uri, attribute.prefix.as_deref());
            }
            // reversed so the first child is visited next
            stack.extend(element.child_elements().collect::<Vec<_>>().into_iter().rev());
        }
        table
    }

    fn qualified(prefixes: &PrefixTable, namespace: Option<&str>, local_name: &str) -> String {
        match namespace.and_then(|uri| prefixes.get_prefix(uri)) {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_string(),
        }
    }

    fn write_element(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        element: &Element,
        prefixes: &PrefixTable,
        root_comments: Option<&[String]>,
        element_count: &mut usize,
    ) -> ErnResult<()> {
        *element_count += 1;
        let qname = Self::qualified(prefixes, element.namespace.as_deref(), &element.local_name);
        let mut start = BytesStart::new(qname.as_str());

        if root_comments.is_some() {
            for (prefix, uri) in prefixes.declarations() {
                let key = format!("xmlns:{}", prefix);
                push_escaped(&mut start, &key, uri);
            }
        }

        let mut attributes: Vec<(String, &str)> = element
            .attributes
            .iter()
            .map(|a| {
                (
                    Self::qualified(prefixes, a.namespace.as_deref(), &a.local_name),
                    a.value.as_str(),
                )
            })
            .collect();
        attributes.sort();
        for (key, value) in &attributes {
            push_escaped(&mut start, key, value);
        }

        let comments = root_comments.unwrap_or_default();
        if element.children.is_empty() && comments.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for comment in comments {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
        }
        for child in &element.children {
            match child {
                Node::Element(e) => self.write_element(writer, e, prefixes, None, element_count)?,
                Node::Text(text) => {
                    let escaped = escape_text(text);
                    writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
                }
                Node::Comment(comment) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(qname.as_str())))?;
        Ok(())
    }
}

fn push_escaped(start: &mut BytesStart<'_>, key: &str, value: &str) {
    start.push_attribute(XmlAttribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escape_attribute(value).into_owned().into_bytes()),
    });
}

/// Escape character data; CR is written as a reference so it survives re-parsing
fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

/// Escape an attribute value; whitespace controls are written as references
/// so that attribute-value normalization leaves them intact
fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

fn escape(input: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !input.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match replacement(c) {
            Some(r) => out.push_str(r),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::ns;
    use crate::core::node::Attribute;
    use pretty_assertions::assert_eq;

    fn output(root: &Element) -> String {
        let xml = XmlSerializer::default()
            .document(root, Some(ns::ERN_43), &[])
            .unwrap();
        String::from_utf8(xml.bytes).unwrap()
    }

    #[test]
    fn test_layout() {
        let root = Element::namespaced(ns::ERN_43, "NewReleaseMessage")
            .with_attribute(Attribute::new("MessageSchemaVersionId", "ern/43"))
            .with_attribute(Attribute::new("LanguageAndScriptCode", "en"))
            .with_child(
                Element::new("MessageHeader")
                    .with_child(Element::text_element(None, "MessageId", "M<1>"))
                    .with_child(Element::new("MessageRecipient")),
            );
        assert_eq!(
            output(&root),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" LanguageAndScriptCode="en" MessageSchemaVersionId="ern/43">
  <MessageHeader>
    <MessageId>M&lt;1&gt;</MessageId>
    <MessageRecipient/>
  </MessageHeader>
</ern:NewReleaseMessage>
"#
        );
    }

    #[test]
    fn test_extension_prefixes_numbered_in_document_order() {
        let mut rating = Element::namespaced("urn:b", "Rating");
        rating.prefix = Some("bee".to_string());
        let root = Element::namespaced(ns::ERN_43, "NewReleaseMessage")
            .with_attribute(Attribute::namespaced("urn:a", Some("a"), "flag", "1"))
            .with_child(rating);
        let xml = output(&root);
        assert!(xml.contains(r#"xmlns:ext0="urn:a" xmlns:ext1="urn:b" ext0:flag="1""#));
        assert!(xml.contains("<ext1:Rating/>"));
    }

    #[test]
    fn test_control_characters_escaped() {
        let root = Element::new("a")
            .with_attribute(Attribute::new("v", "x\ny\"z"))
            .with_child(Element::text_element(None, "t", "1\r2 & 3"));
        let xml = XmlSerializer::default().document(&root, None, &[]).unwrap();
        let xml = String::from_utf8(xml.bytes).unwrap();
        assert!(xml.contains(r#"v="x&#10;y&quot;z""#));
        assert!(xml.contains("<t>1&#13;2 &amp; 3</t>"));
    }

    #[test]
    fn test_fragment_inherits_prefix() {
        let mut rating = Element::namespaced("http://example.com/custom", "QualityRating");
        rating.prefix = Some("custom".to_string());
        rating.children.push(Node::Text("Hi-Res".to_string()));
        let xml = XmlSerializer::new(NamespaceStrategy::Inherit)
            .fragment(&rating, None)
            .unwrap();
        assert_eq!(
            xml,
            r#"<custom:QualityRating xmlns:custom="http://example.com/custom">Hi-Res</custom:QualityRating>"#
        );
    }
}
