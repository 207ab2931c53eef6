//! ERN Core module
//!
//! This module contains the core functionality for ERN message processing:
//! reading XML into a tree, the structured message model, streaming,
//! canonicalization and building.

pub mod builder;
pub mod canonical;
pub mod encoding;
pub(crate) mod entities;
pub mod error;
pub mod extension;
pub mod message;
pub mod namespace;
pub mod node;
pub mod parser;
pub mod sanity;
pub mod serializer;
pub mod stream;
pub mod tokenizer;
pub mod version;

pub use builder::{
    build, BuildOptions, BuildReport, BuildState, BuildWarning, Builder, MessageAssembler,
    PreflightLevel, Preset,
};
pub use canonical::{canonicalize, canonicalize_with_limits, CanonicalForm};
pub use error::{BuildError, ErnError, ErnResult, ParseError, ParseWarning, SecurityViolation};
pub use extension::{AnchorPolicy, ExtensionAnchor, ExtensionBlock, ExtensionContent};
pub use message::{
    Deal, DealTerms, FlatMessage, MessageHeader, MessageRoot, Party, Release, Resource,
    ResourceKind, StructuredMessage, TopLevel,
};
pub use namespace::NamespaceStrategy;
pub use node::{Attribute, Document, Element, Node};
pub use parser::{DomParser, ParseLimits, ParseOptions};
pub use sanity::{sanity_check, SanityReport};
pub use serializer::XmlSerializer;
pub use stream::{Entity, EntityStream};
pub use version::{detect_version, SchemaVersion};
