//! # ernkit
//!
//! Parse, build and canonicalize DDEX ERN (Electronic Release Notification)
//! messages, with a guaranteed round trip:
//! `canonicalize(build(parse(x))) == canonicalize(x)`.
//!
//! - ERN 3.8.2, 4.2 and 4.3
//! - bounded parsing: nesting depth and DOCTYPE entity expansion limits
//! - content in unknown namespaces survives parse and build unchanged
//! - deterministic, canonical builder output with SHA-256 digests
//! - streaming entity reader for large feeds
//!
//! ```
//! let xml = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43">
//!   <MessageHeader>
//!     <MessageId>MSG-1</MessageId>
//!     <MessageSender><PartyId>PADPIDA2014120301A</PartyId></MessageSender>
//!     <MessageCreatedDateTime>2024-01-01T00:00:00Z</MessageCreatedDateTime>
//!   </MessageHeader>
//!   <ResourceList/>
//!   <ReleaseList/>
//! </ern:NewReleaseMessage>"#;
//!
//! let message = ernkit::parse(xml.as_bytes()).unwrap();
//! assert_eq!(message.header.message_id(), Some("MSG-1"));
//!
//! let built = ernkit::build(&message, &ernkit::BuildOptions::default()).unwrap();
//! assert_eq!(
//!     ernkit::canonicalize(&built).unwrap(),
//!     ernkit::canonicalize(xml.as_bytes()).unwrap()
//! );
//! ```

pub mod core;
pub mod types;
pub mod utils;

pub use crate::core::{
    build, canonicalize, canonicalize_with_limits, detect_version, sanity_check, AnchorPolicy,
    BuildError, BuildOptions, BuildReport, BuildWarning, Builder, CanonicalForm, Deal, DealTerms,
    Document, DomParser, Element, Entity, EntityStream, ErnError, ErnResult, ExtensionBlock,
    FlatMessage, MessageHeader, NamespaceStrategy, ParseError, ParseLimits, ParseOptions,
    ParseWarning, Party, PreflightLevel, Preset, Release, Resource, ResourceKind, SanityReport,
    SchemaVersion, StructuredMessage,
};
pub use types::{Identifier, IdentifierKind};

use std::io::BufRead;

/// Parse a message with default options
pub fn parse(input: &[u8]) -> ErnResult<StructuredMessage> {
    StructuredMessage::parse(input, &ParseOptions::default())
}

/// Parse a message with explicit options
pub fn parse_with_options(input: &[u8], options: &ParseOptions) -> ErnResult<StructuredMessage> {
    StructuredMessage::parse(input, options)
}

/// Parse into a plain document tree, without the message model
pub fn parse_document(input: &[u8]) -> ErnResult<Document> {
    DomParser::new().parse(input)
}

/// Stream the entities of a UTF-8 message
pub fn stream<R: BufRead>(reader: R) -> EntityStream<R> {
    EntityStream::new(reader, ParseOptions::default())
}
