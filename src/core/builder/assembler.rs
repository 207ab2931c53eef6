//! Section-ordered message assembly
//!
//! [`MessageAssembler`] appends the root's children section by section. The
//! sections only move forward: header items first, then resources, releases
//! and deals. Going back, or writing after [`MessageAssembler::finish`], is a
//! [`ErnError::SectionOrder`] error.

use crate::core::error::{ErnError, ErnResult};
use crate::core::message::TopLevel;
use crate::core::node::{Element, Node};
use std::fmt;

/// Assembly progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    Header,
    ResourceSection,
    ReleaseSection,
    DealSection,
    Closed,
}

impl BuildState {
    /// Section a root child opens, `None` for items that stay in the current one
    pub fn for_item(item: &TopLevel) -> Option<Self> {
        match item {
            TopLevel::ResourceList => Some(Self::ResourceSection),
            TopLevel::ReleaseList => Some(Self::ReleaseSection),
            TopLevel::DealList => Some(Self::DealSection),
            TopLevel::Header | TopLevel::PartyList | TopLevel::Other(_) => None,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Builds the root element of a message in section order
#[derive(Debug)]
pub struct MessageAssembler {
    root: Element,
    state: BuildState,
}

impl MessageAssembler {
    /// Start assembling under an empty `root`
    pub fn new(root: Element) -> Self {
        Self {
            root,
            state: BuildState::Header,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Move to `next`; staying in the current section is allowed
    pub fn enter(&mut self, next: BuildState) -> ErnResult<()> {
        if self.state == BuildState::Closed || next < self.state {
            return Err(ErnError::SectionOrder {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Append a child in the current section
    pub fn append(&mut self, element: Element) -> ErnResult<()> {
        if self.state == BuildState::Closed {
            return Err(ErnError::SectionOrder {
                from: BuildState::Closed.to_string(),
                to: element.local_name,
            });
        }
        self.root.children.push(Node::Element(element));
        Ok(())
    }

    /// Enter `section` and append `element` there
    pub fn append_in(&mut self, section: BuildState, element: Element) -> ErnResult<()> {
        self.enter(section)?;
        self.append(element)
    }

    /// Close the message and take the root
    pub fn finish(&mut self) -> ErnResult<Element> {
        self.enter(BuildState::Closed)?;
        Ok(std::mem::replace(&mut self.root, Element::new("")))
    }
}
