//! Extension capture and reinsertion
//!
//! Elements and attributes in namespaces outside the known schema set are
//! lifted out of the tree as [`ExtensionBlock`]s. Each block remembers where
//! it was found as an [`ExtensionAnchor`]: the path of its parent through
//! known elements (`/NewReleaseMessage/ResourceList[1]/SoundRecording[2]`)
//! and its position among the parent's element children.
//!
//! The builder puts blocks back with [`reinsert`], in capture order.

use crate::core::error::{ErnError, ErnResult};
use crate::core::namespace::{KnownNamespaces, NamespaceStrategy};
use crate::core::node::{Attribute, Element, Node};
use crate::core::serializer::XmlSerializer;
use serde::{Deserialize, Serialize};

/// Where an extension sat in the source document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionAnchor {
    /// Path of the parent element, one `Name[n]` segment per level
    pub parent_path: String,
    /// Position among the parent's element children (attributes use 0)
    pub sibling_index: usize,
}

/// Captured extension content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionContent {
    /// A whole element subtree
    Element(Element),
    /// A single attribute on a known element
    Attribute(Attribute),
}

/// A relocatable piece of content in an unknown namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionBlock {
    /// Namespace URI
    pub namespace_uri: String,
    /// Local name of the element or attribute
    pub local_name: String,
    /// Prefix used in the source
    pub prefix_hint: Option<String>,
    /// Source position
    pub anchor: ExtensionAnchor,
    /// The captured content
    pub content: ExtensionContent,
    /// Standalone serialization, kept when raw extensions are requested
    pub raw: Option<String>,
}

impl ExtensionBlock {
    /// Whether this block is an attribute
    pub fn is_attribute(&self) -> bool {
        matches!(self.content, ExtensionContent::Attribute(_))
    }

    /// The captured element, if this block is one
    pub fn element(&self) -> Option<&Element> {
        match &self.content {
            ExtensionContent::Element(e) => Some(e),
            ExtensionContent::Attribute(_) => None,
        }
    }

    /// Text content of a leaf extension element or the attribute value
    pub fn value(&self) -> Option<&str> {
        match &self.content {
            ExtensionContent::Element(e) => e.text(),
            ExtensionContent::Attribute(a) => Some(&a.value),
        }
    }
}

/// What to do when a block's parent path no longer exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorPolicy {
    /// Attach to the nearest existing ancestor and record a warning
    #[default]
    Reattach,
    /// Fail with [`ErnError::ExtensionAnchorLost`]
    Fail,
}

/// A block that was not put back at its exact anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reattachment {
    /// The recorded anchor path
    pub original_path: String,
    /// Path of the ancestor that received the block
    pub attached_to: String,
    /// `{namespace}local` of the block
    pub name: String,
}

/// Root path segment for an element
pub(crate) fn root_path(root: &Element) -> String {
    format!("/{}", root.local_name)
}

/// Capture every extension in the tree below `root`, including its own attributes
pub fn capture(root: &mut Element, known: &KnownNamespaces, include_raw: bool) -> ErnResult<Vec<ExtensionBlock>> {
    let path = root_path(root);
    capture_within(root, &path, known, include_raw)
}

/// Capture extensions from `element`, whose own path is `path`
///
/// Extension elements are removed from the tree and flagged; extension
/// attributes are removed from their element.
pub(crate) fn capture_within(
    element: &mut Element,
    path: &str,
    known: &KnownNamespaces,
    include_raw: bool,
) -> ErnResult<Vec<ExtensionBlock>> {
    let mut blocks = Vec::new();
    walk(element, path, known, include_raw, &mut blocks)?;
    Ok(blocks)
}

fn walk(
    element: &mut Element,
    path: &str,
    known: &KnownNamespaces,
    include_raw: bool,
    blocks: &mut Vec<ExtensionBlock>,
) -> ErnResult<()> {
    let (kept, foreign): (Vec<_>, Vec<_>) = std::mem::take(&mut element.attributes)
        .into_iter()
        .partition(|a| known.contains(a.namespace.as_deref()));
    element.attributes = kept;
    for attribute in foreign {
        blocks.push(ExtensionBlock {
            namespace_uri: attribute.namespace.clone().unwrap_or_default(),
            local_name: attribute.local_name.clone(),
            prefix_hint: attribute.prefix.clone(),
            anchor: ExtensionAnchor {
                parent_path: path.to_string(),
                sibling_index: 0,
            },
            raw: None,
            content: ExtensionContent::Attribute(attribute),
        });
    }

    let mut counter = SegmentCounter::default();
    let mut sibling_index = 0usize;
    let mut children = Vec::with_capacity(element.children.len());
    for node in std::mem::take(&mut element.children) {
        let Node::Element(mut child) = node else {
            children.push(node);
            continue;
        };
        let index = sibling_index;
        sibling_index += 1;
        if known.contains(child.namespace.as_deref()) {
            let child_path = counter.child_path(path, &child.local_name);
            walk(&mut child, &child_path, known, include_raw, blocks)?;
            children.push(Node::Element(child));
        } else {
            blocks.push(element_block(child, path, index, include_raw)?);
        }
    }
    element.children = children;
    Ok(())
}

/// Wrap a detached extension element into a block
pub(crate) fn element_block(
    mut element: Element,
    parent_path: &str,
    sibling_index: usize,
    include_raw: bool,
) -> ErnResult<ExtensionBlock> {
    mark_extension(&mut element);
    let raw = if include_raw {
        Some(XmlSerializer::new(NamespaceStrategy::Inherit).fragment(&element, None)?)
    } else {
        None
    };
    Ok(ExtensionBlock {
        namespace_uri: element.namespace.clone().unwrap_or_default(),
        local_name: element.local_name.clone(),
        prefix_hint: element.prefix.clone(),
        anchor: ExtensionAnchor {
            parent_path: parent_path.to_string(),
            sibling_index,
        },
        content: ExtensionContent::Element(element),
        raw,
    })
}

fn mark_extension(element: &mut Element) {
    element.is_extension = true;
    for child in element.child_elements_mut() {
        mark_extension(child);
    }
}

/// Numbers same-named known siblings for path segments
#[derive(Debug, Default)]
pub(crate) struct SegmentCounter {
    seen: Vec<(String, usize)>,
}

impl SegmentCounter {
    /// Path of the next known child named `local_name` under `parent_path`
    pub(crate) fn child_path(&mut self, parent_path: &str, local_name: &str) -> String {
        let n = match self.seen.iter_mut().find(|(name, _)| name == local_name) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                self.seen.push((local_name.to_string(), 1));
                1
            }
        };
        format!("{}/{}[{}]", parent_path, local_name, n)
    }
}

/// Parse `Name[n]` path segments after the root segment
fn path_segments(path: &str) -> Option<Vec<(&str, usize)>> {
    let mut parts = path.trim_start_matches('/').split('/');
    parts.next()?;
    parts
        .map(|segment| {
            let (name, rest) = segment.split_once('[')?;
            let n = rest.strip_suffix(']')?.parse::<usize>().ok()?;
            Some((name, n))
        })
        .collect()
}

/// Follow `segments` from `root` as far as they exist
///
/// Returns the index path of the deepest resolved element and how many
/// segments it consumed.
fn resolve_path(root: &Element, segments: &[(&str, usize)]) -> (Vec<usize>, usize) {
    let mut indices = Vec::new();
    let mut current = root;
    for (depth, (name, n)) in segments.iter().enumerate() {
        let found = current
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(e) if !e.is_extension && e.local_name == *name => Some((i, e)),
                _ => None,
            })
            .nth(n.saturating_sub(1));
        match found {
            Some((i, e)) if *n > 0 => {
                indices.push(i);
                current = e;
            }
            _ => return (indices, depth),
        }
    }
    let consumed = segments.len();
    (indices, consumed)
}

fn element_at_mut<'a>(root: &'a mut Element, indices: &[usize]) -> Option<&'a mut Element> {
    let mut current = root;
    for &i in indices {
        current = current.children.get_mut(i)?.as_element_mut()?;
    }
    Some(current)
}

fn segments_path(root: &Element, segments: &[(&str, usize)]) -> String {
    let mut path = root_path(root);
    for (name, n) in segments {
        path.push_str(&format!("/{}[{}]", name, n));
    }
    path
}

/// Put captured blocks back into `root`
///
/// Blocks are processed in order; element blocks land at their recorded
/// position among the parent's element children, or at the end when the
/// parent has fewer children now.
pub fn reinsert(
    root: &mut Element,
    blocks: &[ExtensionBlock],
    policy: AnchorPolicy,
) -> ErnResult<Vec<Reattachment>> {
    let mut reattached = Vec::new();
    for block in blocks {
        let segments = path_segments(&block.anchor.parent_path).unwrap_or_default();
        let (indices, consumed) = resolve_path(root, &segments);
        let exact = consumed == segments.len();
        if !exact {
            let attached_to = segments_path(root, &segments[..consumed]);
            if policy == AnchorPolicy::Fail {
                return Err(ErnError::ExtensionAnchorLost {
                    namespace: block.namespace_uri.clone(),
                    name: block.local_name.clone(),
                    path: block.anchor.parent_path.clone(),
                });
            }
            tracing::warn!(
                path = %block.anchor.parent_path,
                attached_to = %attached_to,
                "extension {}:{} reattached to nearest ancestor",
                block.namespace_uri,
                block.local_name
            );
            reattached.push(Reattachment {
                original_path: block.anchor.parent_path.clone(),
                attached_to,
                name: format!("{{{}}}{}", block.namespace_uri, block.local_name),
            });
        }

        let Some(parent) = element_at_mut(root, &indices) else {
            return Err(ErnError::ExtensionAnchorLost {
                namespace: block.namespace_uri.clone(),
                name: block.local_name.clone(),
                path: block.anchor.parent_path.clone(),
            });
        };
        match &block.content {
            ExtensionContent::Attribute(attribute) => parent.set_attribute(attribute.clone()),
            ExtensionContent::Element(element) => {
                let position = if exact {
                    node_position(parent, block.anchor.sibling_index)
                } else {
                    parent.children.len()
                };
                parent
                    .children
                    .insert(position, Node::Element(element.clone()));
            }
        }
    }
    Ok(reattached)
}

/// Index in `children` before the `sibling_index`-th element child
fn node_position(parent: &Element, sibling_index: usize) -> usize {
    parent
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, Node::Element(_)))
        .nth(sibling_index)
        .map(|(i, _)| i)
        .unwrap_or(parent.children.len())
}
