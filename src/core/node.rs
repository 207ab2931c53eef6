//! Document tree types
//!
//! This module defines the generic XML tree used underneath the structured
//! ERN model:
//! - [`Element`]: a namespaced element with ordered attributes and children
//! - [`Node`]: element, text or comment content of an element
//! - [`Document`]: a root element plus the comments found outside it

use serde::{Deserialize, Serialize};

/// A namespaced attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Source prefix, kept as a hint for prefix inheritance
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Namespace URI (unprefixed attributes have none)
    pub namespace: Option<String>,
    /// Normalized value
    pub value: String,
}

impl Attribute {
    /// Create an attribute without a namespace
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
            value: value.into(),
        }
    }

    /// Create a namespaced attribute
    pub fn namespaced(
        namespace: impl Into<String>,
        prefix: Option<&str>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local_name: local_name.into(),
            namespace: Some(namespace.into()),
            value: value.into(),
        }
    }

    /// Whether this attribute has the given namespace and local name
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }
}

/// Content of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Character data, with references resolved
    Text(String),
    /// Comment body
    Comment(String),
}

impl Node {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable access to the element, if this node is one
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An XML element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Source prefix, kept as a hint for prefix inheritance
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Namespace URI
    pub namespace: Option<String>,
    /// Attributes in source order (namespace declarations excluded)
    pub attributes: Vec<Attribute>,
    /// Child nodes in source order
    pub children: Vec<Node>,
    /// Set on subtrees captured from an unknown namespace
    #[serde(default)]
    pub is_extension: bool,
}

impl Element {
    /// Create an element without a namespace
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            is_extension: false,
        }
    }

    /// Create an element in `namespace`
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::new(local_name)
        }
    }

    /// Create an element in `namespace` holding a single text node
    pub fn text_element(
        namespace: Option<&str>,
        local_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut element = Self::new(local_name);
        element.namespace = namespace.map(str::to_string);
        element.children.push(Node::Text(text.into()));
        element
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style attribute append
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.set_attribute(attribute);
        self
    }

    /// Value of the un-namespaced attribute `local_name`
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attribute_ns(None, local_name)
    }

    /// Value of the attribute with the given namespace and local name
    pub fn attribute_ns(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.is(namespace, local_name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing one with the same expanded name
    pub fn set_attribute(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.is(attribute.namespace.as_deref(), &attribute.local_name))
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Remove an attribute, returning whether one was removed
    pub fn remove_attribute(&mut self, namespace: Option<&str>, local_name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| !a.is(namespace, local_name));
        self.attributes.len() < before
    }

    /// Whether this element is in `namespace` with local name `local_name`
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate mutably over child elements
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// First child element named `local_name`
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.local_name == local_name)
    }

    /// Mutable first child element named `local_name`
    pub fn child_mut(&mut self, local_name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.local_name == local_name)
    }

    /// All child elements named `local_name`
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |e| e.local_name == local_name)
    }

    /// Whether any child is an element
    pub fn has_element_children(&self) -> bool {
        self.children.iter().any(|n| matches!(n, Node::Element(_)))
    }

    /// First text child, as found in leaf elements
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|n| match n {
            Node::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// Concatenation of the direct text children
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all content with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    /// Follow a path of local names through first matches
    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |current, name| current.child(name))
    }

    /// Collect every element reachable through `path`, branching over repeats
    pub fn find_all<'a>(&'a self, path: &[&str]) -> Vec<&'a Element> {
        let mut current = vec![self];
        for name in path {
            let name: &str = name;
            current = current
                .into_iter()
                .flat_map(|e| e.child_elements().filter(move |c| c.local_name == name))
                .collect();
        }
        current
    }

    /// Every descendant element named `local_name`, in document order
    pub fn descendants_named<'a>(&'a self, local_name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(local_name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local_name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.local_name == local_name {
                found.push(child);
            }
            child.collect_descendants(local_name, found);
        }
    }

    /// Number of elements in this subtree, including this one
    pub fn element_count(&self) -> usize {
        1 + self
            .child_elements()
            .map(Element::element_count)
            .sum::<usize>()
    }

    /// Qualified name using the source prefix
    pub fn source_qname(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Remove all comment nodes in this subtree, returning them in order
    pub fn take_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        self.drain_comments(&mut comments);
        comments
    }

    fn drain_comments(&mut self, out: &mut Vec<String>) {
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                Node::Comment(c) => out.push(c),
                Node::Element(mut e) => {
                    e.drain_comments(out);
                    kept.push(Node::Element(e));
                }
                text => kept.push(text),
            }
        }
        self.children = kept;
        self.merge_adjacent_text();
    }

    /// Drop whitespace-only text from elements that contain elements
    ///
    /// Leaf text, including whitespace-only leaf text, is kept.
    pub fn strip_insignificant_whitespace(&mut self) {
        if self.has_element_children() {
            self.children.retain(|n| match n {
                Node::Text(t) => !is_xml_whitespace(t),
                _ => true,
            });
        }
        for child in self.child_elements_mut() {
            child.strip_insignificant_whitespace();
        }
    }

    /// Join neighbouring text nodes left behind by removed content
    pub fn merge_adjacent_text(&mut self) {
        let mut merged: Vec<Node> = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match (merged.last_mut(), node) {
                (Some(Node::Text(prev)), Node::Text(next)) => prev.push_str(&next),
                (_, node) => merged.push(node),
            }
        }
        self.children = merged;
    }
}

/// Whether text consists only of XML whitespace
pub fn is_xml_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The root element
    pub root: Element,
    /// Comments before or after the root element
    pub outer_comments: Vec<String>,
}

impl Document {
    /// Wrap a root element
    pub fn new(root: Element) -> Self {
        Self {
            root,
            outer_comments: Vec::new(),
        }
    }

    /// Number of elements in the document
    pub fn element_count(&self) -> usize {
        self.root.element_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::ns;

    fn sample() -> Element {
        Element::new("Release")
            .with_child(Element::text_element(None, "ReleaseReference", "R1"))
            .with_child(
                Element::new("ReleaseId")
                    .with_child(Element::text_element(None, "ICPN", "0123456789012")),
            )
            .with_child(Element::text_element(None, "Genre", "Pop"))
            .with_child(Element::text_element(None, "Genre", "Rock"))
    }

    #[test]
    fn test_find_paths() {
        let release = sample();
        assert_eq!(
            release.find(&["ReleaseId", "ICPN"]).and_then(Element::text),
            Some("0123456789012")
        );
        assert!(release.find(&["ReleaseId", "GRid"]).is_none());
        let genres: Vec<_> = release
            .find_all(&["Genre"])
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(genres, vec!["Pop", "Rock"]);
        assert_eq!(release.element_count(), 6);
    }

    #[test]
    fn test_attributes_replace() {
        let mut e = Element::new("Deal");
        e.set_attribute(Attribute::new("LanguageAndScriptCode", "en"));
        e.set_attribute(Attribute::new("LanguageAndScriptCode", "de"));
        e.set_attribute(Attribute::namespaced(ns::XSI, Some("xsi"), "type", "x"));
        assert_eq!(e.attributes.len(), 2);
        assert_eq!(e.attribute("LanguageAndScriptCode"), Some("de"));
        assert_eq!(e.attribute_ns(Some(ns::XSI), "type"), Some("x"));
        assert!(e.remove_attribute(Some(ns::XSI), "type"));
        assert!(!e.remove_attribute(Some(ns::XSI), "type"));
    }

    #[test]
    fn test_strip_whitespace_keeps_leaf_text() {
        let mut e = Element::new("A");
        e.children.push(Node::Text("\n  ".to_string()));
        e.children
            .push(Node::Element(Element::text_element(None, "B", "  ")));
        e.children.push(Node::Text("\n".to_string()));
        e.strip_insignificant_whitespace();
        assert_eq!(e.children.len(), 1);
        assert_eq!(e.child("B").and_then(Element::text), Some("  "));
    }

    #[test]
    fn test_take_comments_merges_text() {
        let mut e = Element::new("A");
        e.children.push(Node::Text("a".to_string()));
        e.children.push(Node::Comment(" note ".to_string()));
        e.children.push(Node::Text("b".to_string()));
        assert_eq!(e.take_comments(), vec![" note ".to_string()]);
        assert_eq!(e.children, vec![Node::Text("ab".to_string())]);
    }
}
