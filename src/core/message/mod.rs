//! Structured ERN message
//!
//! This module provides [`StructuredMessage`], the domain view of one ERN
//! document: header, parties, resources, releases and deals, each entity
//! owning the element it was read from. Construction runs in two passes:
//! entities are built first, then [`ReferenceIndex`] resolves the reference
//! strings between them.
//!
//! Content in unknown namespaces never reaches the entities; it is held in
//! [`StructuredMessage::extensions`] until the builder puts it back.

use crate::core::error::{ErnResult, ParseWarning};
use crate::core::extension::{capture, ExtensionBlock};
use crate::core::namespace::KnownNamespaces;
use crate::core::node::{Attribute, Document, Element, Node};
use crate::core::parser::{DomParser, ParseOptions};
use crate::core::stream::EntityStream;
use crate::core::version::{version_of_root, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[macro_use]
mod macros;
mod deal;
pub(crate) mod fields;
mod flat;
mod header;
mod party;
mod release;
mod resolve;
mod resource;

pub use deal::{Deal, DealTerms};
pub use flat::{FlatDeal, FlatMessage, FlatRelease, FlatTrack, MessageStats};
pub use header::{HeaderParty, MessageHeader};
pub use party::Party;
pub use release::Release;
pub use resolve::ReferenceIndex;
pub use resource::{Resource, ResourceKind};

/// Root element of a message, without its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRoot {
    /// Local name (`NewReleaseMessage`, `PurgeReleaseMessage`, ...)
    pub local_name: String,
    /// Namespace URI
    pub namespace: Option<String>,
    /// Source prefix
    pub prefix: Option<String>,
    /// Attributes in schema namespaces
    pub attributes: Vec<Attribute>,
    /// List elements are in the root namespace rather than unqualified
    #[serde(default)]
    pub qualified_lists: bool,
    /// Schema attributes of the list elements, by list name
    #[serde(default)]
    pub list_attributes: BTreeMap<String, Vec<Attribute>>,
}

impl MessageRoot {
    /// Root of a fresh `NewReleaseMessage`
    pub fn new_release_message(version: SchemaVersion) -> Self {
        Self {
            local_name: "NewReleaseMessage".to_string(),
            namespace: Some(version.namespace().to_string()),
            prefix: Some("ern".to_string()),
            attributes: vec![
                Attribute::new("MessageSchemaVersionId", version.schema_version_id()),
                Attribute::new("LanguageAndScriptCode", "en"),
            ],
            qualified_lists: false,
            list_attributes: BTreeMap::new(),
        }
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            local_name: element.local_name.clone(),
            namespace: element.namespace.clone(),
            prefix: element.prefix.clone(),
            attributes: element.attributes.clone(),
            qualified_lists: false,
            list_attributes: BTreeMap::new(),
        }
    }

    /// An empty list element named `name`, qualified like the source lists
    /// and carrying the attributes the source list had
    pub fn list_element(&self, name: &str) -> Element {
        let mut list = Element::new(name);
        if self.qualified_lists {
            list.namespace = self.namespace.clone();
            list.prefix = self.prefix.clone();
        }
        if let Some(attributes) = self.list_attributes.get(name) {
            list.attributes = attributes.clone();
        }
        list
    }

    /// Remember the attributes of a source list element; the first list wins
    pub(crate) fn keep_list_attributes(&mut self, list: &Element) {
        if list.attributes.is_empty() {
            return;
        }
        self.list_attributes
            .entry(list.local_name.clone())
            .or_insert_with(|| list.attributes.clone());
    }

    /// An empty element for this root
    pub fn to_element(&self) -> Element {
        Element {
            prefix: self.prefix.clone(),
            local_name: self.local_name.clone(),
            namespace: self.namespace.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
            is_extension: false,
        }
    }
}

/// One child of the message root, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopLevel {
    /// `MessageHeader`
    Header,
    /// `PartyList`
    PartyList,
    /// `ResourceList`
    ResourceList,
    /// `ReleaseList`
    ReleaseList,
    /// `DealList`
    DealList,
    /// Any other schema element (`UpdateIndicator`, `WorkList`, ...)
    Other(Element),
}

impl TopLevel {
    /// Placeholder for a root child named `local_name`, `None` for other elements
    pub(crate) fn for_name(local_name: &str) -> Option<Self> {
        match local_name {
            "MessageHeader" => Some(Self::Header),
            "PartyList" => Some(Self::PartyList),
            "ResourceList" => Some(Self::ResourceList),
            "ReleaseList" => Some(Self::ReleaseList),
            "DealList" => Some(Self::DealList),
            _ => None,
        }
    }

    /// Element name of a list placeholder
    pub fn list_name(&self) -> Option<&'static str> {
        match self {
            Self::PartyList => Some("PartyList"),
            Self::ResourceList => Some("ResourceList"),
            Self::ReleaseList => Some("ReleaseList"),
            Self::DealList => Some("DealList"),
            Self::Header | Self::Other(_) => None,
        }
    }
}

/// A parsed or programmatically assembled ERN message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    version: SchemaVersion,
    root: MessageRoot,
    /// Message header
    pub header: MessageHeader,
    /// Parties in `PartyList` order
    pub parties: Vec<Party>,
    /// Resources in `ResourceList` order
    pub resources: Vec<Resource>,
    /// Releases in `ReleaseList` order
    pub releases: Vec<Release>,
    /// `ReleaseDeal`s in `DealList` order
    pub deals: Vec<Deal>,
    /// Captured extensions, in capture order
    pub extensions: Vec<ExtensionBlock>,
    /// Comments, when requested at parse time
    pub comments: Vec<String>,
    layout: Vec<TopLevel>,
    warnings: Vec<ParseWarning>,
    #[serde(skip)]
    index: ReferenceIndex,
}

impl StructuredMessage {
    /// Create an empty `NewReleaseMessage`
    pub fn new(version: SchemaVersion) -> Self {
        Self::with_root(version, MessageRoot::new_release_message(version))
    }

    fn with_root(version: SchemaVersion, root: MessageRoot) -> Self {
        Self {
            version,
            root,
            header: MessageHeader::new(),
            parties: Vec::new(),
            resources: Vec::new(),
            releases: Vec::new(),
            deals: Vec::new(),
            extensions: Vec::new(),
            comments: Vec::new(),
            layout: Vec::new(),
            warnings: Vec::new(),
            index: ReferenceIndex::default(),
        }
    }

    /// Parse a message from bytes
    pub fn parse(input: &[u8], options: &ParseOptions) -> ErnResult<Self> {
        if options.streaming {
            let utf8 = crate::core::encoding::convert_to_utf8(input)?;
            return Self::from_stream(EntityStream::new(utf8.as_ref(), options.clone()), options);
        }
        let document = DomParser::with_limits(options.limits)
            .include_comments(options.include_comments)
            .parse(input)?;
        Self::from_document(document, options)
    }

    /// Build the model from a document tree
    pub fn from_document(document: Document, options: &ParseOptions) -> ErnResult<Self> {
        let Document {
            mut root,
            outer_comments,
        } = document;
        let version = version_of_root(
            root.namespace.as_deref(),
            root.attribute("MessageSchemaVersionId"),
        )?;
        let known = KnownNamespaces::new(
            root.namespace
                .clone()
                .unwrap_or_else(|| version.namespace().to_string()),
        );
        let extensions = capture(&mut root, &known, options.include_raw_extensions)?;

        let mut message = Self::with_root(version, MessageRoot::from_element(&root));
        message.extensions = extensions;
        message.comments = outer_comments;
        for node in std::mem::take(&mut root.children) {
            match node {
                Node::Element(mut element) => {
                    message.comments.extend(element.take_comments());
                    message.push_top_level(element);
                }
                Node::Comment(comment) => message.comments.push(comment),
                Node::Text(_) => {}
            }
        }
        message.finish(options.validate_references);
        tracing::debug!(
            version = %version,
            resources = message.resources.len(),
            releases = message.releases.len(),
            deals = message.deals.len(),
            extensions = message.extensions.len(),
            "parsed message"
        );
        Ok(message)
    }

    /// Build the model from an entity stream
    pub fn from_stream<R: std::io::BufRead>(
        mut stream: EntityStream<R>,
        options: &ParseOptions,
    ) -> ErnResult<Self> {
        let mut entities = Vec::new();
        for entity in stream.by_ref() {
            entities.push(entity?);
        }
        let (version, root) = stream.root_info()?;
        let mut message = Self::with_root(version, root);
        let mut others = std::collections::VecDeque::new();
        for entity in entities {
            match entity {
                crate::core::stream::Entity::Header(header) => message.header = header,
                crate::core::stream::Entity::Party(party) => message.parties.push(party),
                crate::core::stream::Entity::Resource(resource) => message.resources.push(resource),
                crate::core::stream::Entity::Release(release) => message.releases.push(release),
                crate::core::stream::Entity::Deal(deal) => message.deals.push(deal),
                crate::core::stream::Entity::Other(element) => others.push_back(element),
                crate::core::stream::Entity::Extension(block) => message.extensions.push(block),
            }
        }
        message.layout = stream
            .layout()
            .iter()
            .filter_map(|slot| match slot {
                Some(item) => Some(item.clone()),
                None => others.pop_front().map(TopLevel::Other),
            })
            .collect();
        message.comments = stream.take_comments();
        message.finish(options.validate_references);
        Ok(message)
    }

    /// Sort one root child into the model
    pub(crate) fn push_top_level(&mut self, element: Element) {
        let schema = element.namespace.is_none() || element.namespace == self.root.namespace;
        let item = match TopLevel::for_name(&element.local_name) {
            Some(item) if schema => item,
            _ => {
                self.layout.push(TopLevel::Other(element));
                return;
            }
        };
        if item.list_name().is_some() {
            if element.namespace.is_some() {
                self.root.qualified_lists = true;
            }
            self.root.keep_list_attributes(&element);
        }
        let version = self.version;
        match item {
            TopLevel::Header => self.header = MessageHeader::from_element(element),
            TopLevel::PartyList => self
                .parties
                .extend(list_entries(element).map(Party::from_element)),
            TopLevel::ResourceList => self
                .resources
                .extend(list_entries(element).map(|e| Resource::from_element(e, version))),
            TopLevel::ReleaseList => self
                .releases
                .extend(list_entries(element).map(|e| Release::from_element(e, version))),
            TopLevel::DealList => self
                .deals
                .extend(list_entries(element).map(|e| Deal::from_element(e, version))),
            TopLevel::Other(_) => {}
        }
        if !self.layout.contains(&item) {
            self.layout.push(item);
        }
    }

    fn finish(&mut self, validate: bool) {
        let (index, warnings) = ReferenceIndex::build(
            &self.parties,
            &self.resources,
            &self.releases,
            &self.deals,
            validate,
        );
        self.index = index;
        self.warnings = warnings;
    }

    /// Rebuild the reference index after editing entity lists
    pub fn resolve_references(&mut self) -> &[ParseWarning] {
        self.finish(true);
        &self.warnings
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn root(&self) -> &MessageRoot {
        &self.root
    }

    /// Mutable root, for root attributes
    pub fn root_mut(&mut self) -> &mut MessageRoot {
        &mut self.root
    }

    /// Root children in source order
    pub fn layout(&self) -> &[TopLevel] {
        &self.layout
    }

    /// Warnings from the last reference resolution
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Reference index from the last resolution
    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// Layout the builder writes: the source layout plus any section that
    /// has content (or that a `NewReleaseMessage` requires) but no place yet
    pub(crate) fn effective_layout(&self) -> Vec<TopLevel> {
        let mut layout = self.layout.clone();
        if !layout.contains(&TopLevel::Header) {
            layout.insert(0, TopLevel::Header);
        }
        let release_message = self.root.local_name == "NewReleaseMessage";
        let wanted = [
            (TopLevel::PartyList, !self.parties.is_empty()),
            (
                TopLevel::ResourceList,
                release_message || !self.resources.is_empty(),
            ),
            (
                TopLevel::ReleaseList,
                release_message || !self.releases.is_empty(),
            ),
            (TopLevel::DealList, !self.deals.is_empty()),
        ];
        for (item, needed) in wanted {
            if !needed || layout.contains(&item) {
                continue;
            }
            let rank = section_rank(&item);
            let position = layout
                .iter()
                .position(|existing| {
                    !matches!(existing, TopLevel::Other(_)) && section_rank(existing) > rank
                })
                .unwrap_or(layout.len());
            layout.insert(position, item);
        }
        layout
    }

    /// Resource keyed by `reference`
    pub fn resource(&self, reference: &str) -> Option<&Resource> {
        lookup(&self.resources, self.index.resource(reference), reference, Resource::reference)
    }

    /// Release keyed by `reference`
    pub fn release(&self, reference: &str) -> Option<&Release> {
        lookup(&self.releases, self.index.release(reference), reference, Release::reference)
    }

    /// Party keyed by `reference`
    pub fn party(&self, reference: &str) -> Option<&Party> {
        lookup(&self.parties, self.index.party(reference), reference, Party::reference)
    }

    /// Tracks of `release` in order, with the resource each reference resolves to
    pub fn release_tracks<'a>(&'a self, release: &'a Release) -> Vec<(&'a str, Option<&'a Resource>)> {
        release
            .resource_references()
            .into_iter()
            .map(|reference| (reference, self.resource(reference)))
            .collect()
    }

    /// Lossy flat projection for reporting
    pub fn flatten(&self) -> FlatMessage {
        FlatMessage::from_message(self)
    }
}

impl FromStr for StructuredMessage {
    type Err = crate::core::error::ErnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes(), &ParseOptions::default())
    }
}

/// Builder section a root child belongs to
fn section_rank(item: &TopLevel) -> usize {
    match item {
        TopLevel::Header | TopLevel::PartyList | TopLevel::Other(_) => 0,
        TopLevel::ResourceList => 1,
        TopLevel::ReleaseList => 2,
        TopLevel::DealList => 3,
    }
}

/// Element children of a list; whitespace between them is dropped
fn list_entries(list: Element) -> impl Iterator<Item = Element> {
    list.children.into_iter().filter_map(|node| match node {
        Node::Element(e) => Some(e),
        _ => None,
    })
}

/// Indexed lookup that falls back to a scan when the index is stale
fn lookup<'a, T>(
    items: &'a [T],
    indexed: Option<usize>,
    reference: &str,
    key: fn(&T) -> Option<&str>,
) -> Option<&'a T> {
    indexed
        .and_then(|i| items.get(i))
        .filter(|item| key(item) == Some(reference))
        .or_else(|| items.iter().find(|item| key(item) == Some(reference)))
}
