//! ERN XML parser
//!
//! This module provides the configuration shared by every reader
//! ([`ParseLimits`], [`ParseOptions`]) and [`DomParser`], which builds a
//! [`Document`] tree from the token stream.

use crate::core::encoding::convert_to_utf8;
use crate::core::entities::EntityLimits;
use crate::core::error::{ErnError, ErnResult};
use crate::core::node::{Document, Element, Node};
use crate::core::tokenizer::{StartTag, Token, Tokenizer};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Resource bounds applied while reading a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Maximum element nesting depth
    pub max_depth: usize,
    /// Total bytes entity expansion may produce
    pub max_entity_expansion_bytes: usize,
    /// Maximum nesting of entity references inside entity values
    pub max_entity_nesting: usize,
    /// Maximum number of entity declarations in the internal subset
    pub max_entity_declarations: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_entity_expansion_bytes: 1024 * 1024,
            max_entity_nesting: 8,
            max_entity_declarations: 256,
        }
    }
}

impl ParseLimits {
    pub(crate) fn entity_limits(&self) -> EntityLimits {
        EntityLimits {
            max_expansion_bytes: self.max_entity_expansion_bytes,
            max_nesting: self.max_entity_nesting,
            max_declarations: self.max_entity_declarations,
        }
    }
}

/// Options for building a structured message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Keep a serialized copy of every extension subtree
    pub include_raw_extensions: bool,
    /// Collect comments into the message
    pub include_comments: bool,
    /// Record warnings for references that resolve to nothing
    pub validate_references: bool,
    /// Build the message entity by entity without a full document tree
    pub streaming: bool,
    /// Resource bounds
    pub limits: ParseLimits,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_raw_extensions: false,
            include_comments: false,
            validate_references: true,
            streaming: false,
            limits: ParseLimits::default(),
        }
    }
}

impl ParseOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep serialized extension subtrees
    pub fn with_raw_extensions(mut self, include: bool) -> Self {
        self.include_raw_extensions = include;
        self
    }

    /// Collect comments
    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Record dangling reference warnings
    pub fn with_reference_validation(mut self, validate: bool) -> Self {
        self.validate_references = validate;
        self
    }

    /// Use the streaming reader
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Replace the resource bounds
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Parser producing a [`Document`] tree
#[derive(Debug, Clone, Default)]
pub struct DomParser {
    limits: ParseLimits,
    include_comments: bool,
}

impl DomParser {
    /// Create a parser with default limits that drops comments
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with explicit limits
    pub fn with_limits(limits: ParseLimits) -> Self {
        Self {
            limits,
            include_comments: false,
        }
    }

    /// Keep comments in the tree
    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Parse raw bytes, detecting the encoding
    pub fn parse(&self, input: &[u8]) -> ErnResult<Document> {
        let utf8 = convert_to_utf8(input)?;
        self.parse_reader(utf8.as_ref())
    }

    /// Parse UTF-8 input from a buffered reader
    pub fn parse_reader<R: BufRead>(&self, source: R) -> ErnResult<Document> {
        let mut tokenizer = Tokenizer::new(source, self.limits);
        let mut outer_comments = Vec::new();
        loop {
            match tokenizer.next_token()? {
                Token::Start(start) => {
                    let root = read_subtree(&mut tokenizer, start, self.include_comments)?;
                    // trailing comments, then end of input
                    loop {
                        match tokenizer.next_token()? {
                            Token::Comment(c) if self.include_comments => outer_comments.push(c),
                            Token::Eof => break,
                            _ => {}
                        }
                    }
                    tracing::debug!(elements = root.element_count(), "parsed document");
                    return Ok(Document {
                        root,
                        outer_comments,
                    });
                }
                Token::Comment(c) if self.include_comments => outer_comments.push(c),
                Token::Eof => {
                    return Err(ErnError::syntax("no root element", tokenizer.position()))
                }
                _ => {}
            }
        }
    }
}

/// Element for a start tag, without children
pub(crate) fn element_from_start(start: StartTag) -> Element {
    Element {
        prefix: start.prefix,
        local_name: start.local_name,
        namespace: start.namespace,
        attributes: start.attributes,
        children: Vec::new(),
        is_extension: false,
    }
}

/// Read tokens up to the end tag matching `start` into an element tree
///
/// Only the subtree is held in memory, which is what the entity stream relies
/// on. Depth is bounded by the tokenizer.
pub(crate) fn read_subtree<R: BufRead>(
    tokenizer: &mut Tokenizer<R>,
    start: StartTag,
    include_comments: bool,
) -> ErnResult<Element> {
    let mut stack = vec![element_from_start(start)];
    loop {
        match tokenizer.next_token()? {
            Token::Start(start) => stack.push(element_from_start(start)),
            Token::End => {
                let Some(done) = stack.pop() else {
                    return Err(ErnError::syntax("unbalanced end tag", tokenizer.position()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(done)),
                    None => return Ok(done),
                }
            }
            Token::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    match current.children.last_mut() {
                        Some(Node::Text(prev)) => prev.push_str(&text),
                        _ => current.children.push(Node::Text(text)),
                    }
                }
            }
            Token::Comment(comment) => {
                if let (true, Some(current)) = (include_comments, stack.last_mut()) {
                    current.children.push(Node::Comment(comment));
                }
            }
            Token::Eof => {
                return Err(ErnError::syntax(
                    "unexpected end of input",
                    tokenizer.position(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SecurityViolation;
    use crate::core::namespace::ns;

    #[test]
    fn test_parse_simple_document() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" MessageSchemaVersionId="ern/43">
  <MessageHeader>
    <MessageId>MSG-1</MessageId>
  </MessageHeader>
</ern:NewReleaseMessage>"#;
        let doc = DomParser::new().parse(xml).unwrap();
        assert_eq!(doc.root.local_name, "NewReleaseMessage");
        assert_eq!(doc.root.namespace.as_deref(), Some(ns::ERN_43));
        assert_eq!(doc.root.attribute("MessageSchemaVersionId"), Some("ern/43"));
        assert_eq!(
            doc.root
                .find(&["MessageHeader", "MessageId"])
                .and_then(Element::text),
            Some("MSG-1")
        );
        assert_eq!(doc.element_count(), 3);
    }

    #[test]
    fn test_comments_optional() {
        let xml = b"<!-- before --><a><!-- inside --><b/></a>";
        let doc = DomParser::new().parse(xml).unwrap();
        assert!(doc.outer_comments.is_empty());
        assert_eq!(doc.root.children.len(), 1);

        let doc = DomParser::new().include_comments(true).parse(xml).unwrap();
        assert_eq!(doc.outer_comments, vec![" before ".to_string()]);
        assert_eq!(doc.root.children[0], Node::Comment(" inside ".to_string()));
    }

    #[test]
    fn test_text_split_by_dropped_comment_is_joined() {
        let doc = DomParser::new().parse(b"<a>x<!-- c -->y</a>").unwrap();
        assert_eq!(doc.root.children, vec![Node::Text("xy".to_string())]);
    }

    #[test]
    fn test_nesting_limit() {
        let xml = format!("{}{}", "<a>".repeat(600), "</a>".repeat(600));
        let err = DomParser::new().parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ErnError::Security(SecurityViolation::NestingDepth { limit: 512 })
        ));
    }

    #[test]
    fn test_utf16_input() {
        let mut input = vec![0xFF, 0xFE];
        for unit in "<a>Björk</a>".encode_utf16() {
            input.extend_from_slice(&unit.to_le_bytes());
        }
        let doc = DomParser::new().parse(&input).unwrap();
        assert_eq!(doc.root.text(), Some("Björk"));
    }

    #[test]
    fn test_options_from_json() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"include_comments": true, "limits": {"max_depth": 64}}"#)
                .unwrap();
        assert!(options.include_comments);
        assert!(options.validate_references);
        assert_eq!(options.limits.max_depth, 64);
        assert_eq!(options.limits.max_entity_nesting, 8);
    }
}
