//! Streaming entity reader
//!
//! [`EntityStream`] yields the entities of a message one at a time while
//! holding only the entity being read. It walks the root and the list
//! elements token by token and reads each entity as a subtree.
//!
//! Extension capture follows the same rules and the same anchor paths as the
//! DOM path, so a message assembled from a stream equals the parsed one.

use crate::core::error::{ErnError, ErnResult};
use crate::core::encoding::XmlEncoding;
use crate::core::extension::{
    capture_within, element_block, root_path, ExtensionBlock, SegmentCounter,
};
use crate::core::message::{
    Deal, MessageHeader, MessageRoot, Party, Release, Resource, TopLevel,
};
use crate::core::namespace::KnownNamespaces;
use crate::core::node::Element;
use crate::core::parser::{element_from_start, read_subtree, ParseOptions};
use crate::core::tokenizer::{StartTag, Token, Tokenizer};
use crate::core::version::{version_of_root, SchemaVersion};
use std::collections::VecDeque;
use std::io::BufRead;
use std::iter::FusedIterator;

/// One item of an entity stream
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Header(MessageHeader),
    Party(Party),
    Resource(Resource),
    Release(Release),
    /// A `ReleaseDeal`
    Deal(Deal),
    /// Another schema element directly under the root
    Other(Element),
    /// Content in an unknown namespace, in capture order
    Extension(ExtensionBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prolog,
    Root,
    List,
    Epilog,
    Done,
}

/// What is known once the root start tag has been read
#[derive(Debug)]
struct RootState {
    version: SchemaVersion,
    root: MessageRoot,
    known: KnownNamespaces,
    path: String,
    counter: SegmentCounter,
    sibling: usize,
}

/// The list element being read
#[derive(Debug)]
struct ListCursor {
    kind: TopLevel,
    path: String,
    counter: SegmentCounter,
    sibling: usize,
}

/// Lazy sequence of message entities over a buffered reader
///
/// The input must be UTF-8. The stream is fused: after an error it yields
/// nothing more.
pub struct EntityStream<R: BufRead> {
    tokenizer: Tokenizer<R>,
    options: ParseOptions,
    phase: Phase,
    state: Option<RootState>,
    list: Option<ListCursor>,
    layout: Vec<Option<TopLevel>>,
    comments: Vec<String>,
    queue: VecDeque<Entity>,
    failure: Option<ErnError>,
}

impl<R: BufRead> EntityStream<R> {
    pub fn new(mut source: R, options: ParseOptions) -> Self {
        let failure = match source.fill_buf() {
            Ok(head) if XmlEncoding::detect(head) != XmlEncoding::Utf8 => Some(ErnError::syntax(
                "UTF-16 input cannot be streamed; parse it as a document",
                0,
            )),
            Ok(_) => None,
            Err(e) => Some(ErnError::Io(e)),
        };
        Self {
            tokenizer: Tokenizer::new(source, options.limits),
            options,
            phase: Phase::Prolog,
            state: None,
            list: None,
            layout: Vec::new(),
            comments: Vec::new(),
            queue: VecDeque::new(),
            failure,
        }
    }

    /// Schema version, once the root has been read
    pub fn version(&self) -> Option<SchemaVersion> {
        self.state.as_ref().map(|state| state.version)
    }

    /// Version and root of the message read so far
    pub fn root_info(&self) -> ErnResult<(SchemaVersion, MessageRoot)> {
        self.state
            .as_ref()
            .map(|state| (state.version, state.root.clone()))
            .ok_or_else(|| ErnError::syntax("no root element", self.tokenizer.position()))
    }

    /// Root children seen so far; `None` marks an [`Entity::Other`]
    pub(crate) fn layout(&self) -> &[Option<TopLevel>] {
        &self.layout
    }

    /// Comments collected so far
    pub(crate) fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments)
    }

    fn advance(&mut self) -> ErnResult<()> {
        let token = self.tokenizer.next_token()?;
        let position = self.tokenizer.position();
        match (self.phase, token) {
            (_, Token::Comment(comment)) => {
                if self.options.include_comments {
                    self.comments.push(comment);
                }
            }
            (Phase::Prolog, Token::Start(start)) => self.open_root(start)?,
            (Phase::Root, Token::Start(start)) => self.root_child(start)?,
            (Phase::Root, Token::End) => self.phase = Phase::Epilog,
            (Phase::List, Token::Start(start)) => self.list_entry(start)?,
            (Phase::List, Token::End) => {
                self.list = None;
                self.phase = Phase::Root;
            }
            (Phase::Epilog, Token::Eof) => self.phase = Phase::Done,
            (Phase::Epilog, Token::Start(_)) => {
                return Err(ErnError::syntax("content after the root element", position))
            }
            (Phase::Prolog, Token::Eof) => return Err(ErnError::syntax("no root element", position)),
            (_, Token::Eof) => return Err(ErnError::syntax("unexpected end of input", position)),
            _ => {}
        }
        Ok(())
    }

    fn open_root(&mut self, start: StartTag) -> ErnResult<()> {
        let version = version_of_root(
            start.namespace.as_deref(),
            start.attribute("MessageSchemaVersionId"),
        )?;
        let known = KnownNamespaces::new(
            start
                .namespace
                .clone()
                .unwrap_or_else(|| version.namespace().to_string()),
        );
        let mut root = element_from_start(start);
        let path = root_path(&root);
        let blocks = capture_within(&mut root, &path, &known, self.options.include_raw_extensions)?;
        self.queue.extend(blocks.into_iter().map(Entity::Extension));
        tracing::debug!(version = %version, "streaming message");
        self.state = Some(RootState {
            version,
            root: MessageRoot::from_element(&root),
            known,
            path,
            counter: SegmentCounter::default(),
            sibling: 0,
        });
        self.phase = Phase::Root;
        Ok(())
    }

    fn root_child(&mut self, start: StartTag) -> ErnResult<()> {
        let position = self.tokenizer.position();
        let Some(state) = self.state.as_mut() else {
            return Err(ErnError::syntax("element outside the root", position));
        };
        let raw = self.options.include_raw_extensions;
        let index = state.sibling;
        state.sibling += 1;

        if !state.known.contains(start.namespace.as_deref()) {
            let element = read_subtree(&mut self.tokenizer, start, self.options.include_comments)?;
            self.queue.push_back(Entity::Extension(element_block(
                element,
                &state.path,
                index,
                raw,
            )?));
            return Ok(());
        }

        let path = state.counter.child_path(&state.path, &start.local_name);
        let schema = start.namespace.is_none() || start.namespace == state.root.namespace;
        let item = TopLevel::for_name(&start.local_name).filter(|_| schema);
        if let Some(item) = item.clone().filter(|item| item.list_name().is_some()) {
            if start.namespace.is_some() {
                state.root.qualified_lists = true;
            }
            let mut list = element_from_start(start);
            let blocks = capture_within(&mut list, &path, &state.known, raw)?;
            self.queue.extend(blocks.into_iter().map(Entity::Extension));
            state.root.keep_list_attributes(&list);
            if !self.layout.contains(&Some(item.clone())) {
                self.layout.push(Some(item.clone()));
            }
            self.list = Some(ListCursor {
                kind: item,
                path,
                counter: SegmentCounter::default(),
                sibling: 0,
            });
            self.phase = Phase::List;
            return Ok(());
        }

        let mut element = read_subtree(&mut self.tokenizer, start, self.options.include_comments)?;
        let blocks = capture_within(&mut element, &path, &state.known, raw)?;
        self.queue.extend(blocks.into_iter().map(Entity::Extension));
        self.comments.extend(element.take_comments());
        if item == Some(TopLevel::Header) {
            if !self.layout.contains(&Some(TopLevel::Header)) {
                self.layout.push(Some(TopLevel::Header));
            }
            self.queue
                .push_back(Entity::Header(MessageHeader::from_element(element)));
        } else {
            self.layout.push(None);
            self.queue.push_back(Entity::Other(element));
        }
        Ok(())
    }

    fn list_entry(&mut self, start: StartTag) -> ErnResult<()> {
        let position = self.tokenizer.position();
        let (Some(state), Some(cursor)) = (self.state.as_ref(), self.list.as_mut()) else {
            return Err(ErnError::syntax("list entry outside a list", position));
        };
        let raw = self.options.include_raw_extensions;
        let index = cursor.sibling;
        cursor.sibling += 1;
        let mut element = read_subtree(&mut self.tokenizer, start, self.options.include_comments)?;

        if !state.known.contains(element.namespace.as_deref()) {
            self.queue.push_back(Entity::Extension(element_block(
                element,
                &cursor.path,
                index,
                raw,
            )?));
            return Ok(());
        }

        let path = cursor.counter.child_path(&cursor.path, &element.local_name);
        let blocks = capture_within(&mut element, &path, &state.known, raw)?;
        self.queue.extend(blocks.into_iter().map(Entity::Extension));
        self.comments.extend(element.take_comments());
        let version = state.version;
        let entity = match cursor.kind {
            TopLevel::PartyList => Entity::Party(Party::from_element(element)),
            TopLevel::ResourceList => Entity::Resource(Resource::from_element(element, version)),
            TopLevel::ReleaseList => Entity::Release(Release::from_element(element, version)),
            TopLevel::DealList => Entity::Deal(Deal::from_element(element, version)),
            TopLevel::Header | TopLevel::Other(_) => Entity::Other(element),
        };
        self.queue.push_back(entity);
        Ok(())
    }
}

impl<R: BufRead> Iterator for EntityStream<R> {
    type Item = ErnResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.failure.take() {
            self.phase = Phase::Done;
            return Some(Err(error));
        }
        loop {
            if let Some(entity) = self.queue.pop_front() {
                return Some(Ok(entity));
            }
            if self.phase == Phase::Done {
                return None;
            }
            if let Err(error) = self.advance() {
                tracing::debug!(%error, "entity stream stopped");
                self.phase = Phase::Done;
                self.queue.clear();
                return Some(Err(error));
            }
        }
    }
}

impl<R: BufRead> FusedIterator for EntityStream<R> {}
