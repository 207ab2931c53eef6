//! Namespace management for ERN documents
//!
//! Two concerns live here:
//! - [`NamespaceScope`] resolves source prefixes while a document is read.
//! - [`PrefixTable`] assigns output prefixes for canonical serialization.
//!
//! Both are plain per-invocation values. Nothing in this module is global, so
//! independent parses and builds never contend on shared prefix state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Well-known namespaces
pub mod ns {
    /// ERN 3.8.2 namespace
    pub const ERN_382: &str = "http://ddex.net/xml/ern/382";
    /// ERN 4.2 namespace
    pub const ERN_42: &str = "http://ddex.net/xml/ern/42";
    /// ERN 4.3 namespace
    pub const ERN_43: &str = "http://ddex.net/xml/ern/43";
    /// DDEX allowed-value-sets namespace
    pub const AVS: &str = "http://ddex.net/xml/avs/avs";
    /// XML Schema instance namespace
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    /// XML namespace (for xml:lang, etc.)
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Namespace of `xmlns` declarations themselves
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
    /// Prefix locked to the active ERN namespace
    pub const ERN_PREFIX: &str = "ern";
    /// AVS prefix
    pub const AVS_PREFIX: &str = "avs";
    /// XSI prefix
    pub const XSI_PREFIX: &str = "xsi";
    /// XML prefix
    pub const XML_PREFIX: &str = "xml";
    /// Stem of generated prefixes for unknown namespaces
    pub const EXTENSION_PREFIX_STEM: &str = "ext";
}

/// How output prefixes are chosen for namespaces outside the locked table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamespaceStrategy {
    /// `ext0`, `ext1`, ... in first-use order (canonical)
    #[default]
    Locked,
    /// Keep the source prefix when it is free, fall back to `extN`
    Inherit,
}

/// The set of namespaces that belong to the schema of one ERN version
///
/// Content in any other namespace is treated as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownNamespaces {
    active: String,
}

impl KnownNamespaces {
    /// Known set for the given active ERN namespace
    pub fn new(active: impl Into<String>) -> Self {
        Self {
            active: active.into(),
        }
    }

    /// The active ERN namespace URI
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Whether content in `uri` is part of the schema (no namespace is)
    pub fn contains(&self, uri: Option<&str>) -> bool {
        match uri {
            None => true,
            Some(uri) => uri == self.active || uri == ns::AVS || uri == ns::XSI || uri == ns::XML,
        }
    }
}

/// Stack of in-scope prefix bindings while reading a document
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    frames: Vec<Vec<(Option<String>, Option<String>)>>,
}

impl NamespaceScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for an element's declarations
    ///
    /// `None` as prefix is the default namespace; `None` as URI undeclares it.
    pub fn push(&mut self, bindings: Vec<(Option<String>, Option<String>)>) {
        self.frames.push(bindings);
    }

    /// Close the innermost frame
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolve a prefix (or the default namespace when `None`)
    ///
    /// The `xml` prefix is always bound.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some(ns::XML_PREFIX) {
            return Some(ns::XML);
        }
        for frame in self.frames.iter().rev() {
            for (bound, uri) in frame.iter().rev() {
                if bound.as_deref() == prefix {
                    return uri.as_deref();
                }
            }
        }
        None
    }
}

/// Split a qualified name into `(prefix, local)`
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Output prefix assignment for one serialization
///
/// The active ERN namespace, AVS and XSI have fixed prefixes. Every other
/// namespace is numbered in the order [`PrefixTable::assign`] sees it.
#[derive(Debug, Clone)]
pub struct PrefixTable {
    strategy: NamespaceStrategy,
    uri_to_prefix: HashMap<String, String>,
    prefix_to_uri: BTreeMap<String, String>,
    next_ext: usize,
}

impl PrefixTable {
    /// Create a table whose locked entry for ERN is `active`
    ///
    /// Without an active namespace `ern` stays unused.
    pub fn new(active: Option<&str>, strategy: NamespaceStrategy) -> Self {
        let mut uri_to_prefix = HashMap::from([
            (ns::AVS.to_string(), ns::AVS_PREFIX.to_string()),
            (ns::XSI.to_string(), ns::XSI_PREFIX.to_string()),
            (ns::XML.to_string(), ns::XML_PREFIX.to_string()),
        ]);
        if let Some(active) = active {
            uri_to_prefix.insert(active.to_string(), ns::ERN_PREFIX.to_string());
        }
        Self {
            strategy,
            uri_to_prefix,
            prefix_to_uri: BTreeMap::new(),
            next_ext: 0,
        }
    }

    /// Assign (or look up) the prefix for `uri`
    ///
    /// `hint` is the source prefix, honored only under
    /// [`NamespaceStrategy::Inherit`].
    pub fn assign(&mut self, uri: &str, hint: Option<&str>) -> String {
        let prefix = match self.uri_to_prefix.get(uri) {
            Some(prefix) => prefix.clone(),
            None => {
                let prefix = match hint {
                    Some(hint) if self.strategy == NamespaceStrategy::Inherit && self.is_free(hint) => {
                        hint.to_string()
                    }
                    _ => self.next_generated(),
                };
                self.uri_to_prefix.insert(uri.to_string(), prefix.clone());
                prefix
            }
        };
        if uri != ns::XML {
            self.prefix_to_uri.insert(prefix.clone(), uri.to_string());
        }
        prefix
    }

    /// Prefix already assigned to `uri`
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefix.get(uri).map(|s| s.as_str())
    }

    /// Declarations that must appear on the root, sorted by prefix
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    /// Number of declared namespaces
    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    /// Whether no namespace was used
    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }

    fn is_free(&self, prefix: &str) -> bool {
        let reserved = [ns::ERN_PREFIX, ns::AVS_PREFIX, ns::XSI_PREFIX, ns::XML_PREFIX];
        !prefix.is_empty()
            && !prefix.starts_with("xml")
            && !reserved.contains(&prefix)
            && !self.uri_to_prefix.values().any(|p| p == prefix)
    }

    fn next_generated(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", ns::EXTENSION_PREFIX_STEM, self.next_ext);
            self.next_ext += 1;
            if !self.uri_to_prefix.values().any(|p| *p == candidate) {
                return candidate;
            }
        }
    }
}
