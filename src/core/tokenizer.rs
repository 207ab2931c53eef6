//! Bounded, namespace-aware XML tokenizer
//!
//! [`Tokenizer`] wraps a quick-xml [`Reader`] and turns its events into a
//! flat [`Token`] stream that every reader in this crate consumes (the tree
//! builder, the entity stream, the sanity checker and version detection).
//!
//! On top of quick-xml it:
//! - resolves element and attribute prefixes against the in-scope bindings,
//! - resolves character, predefined and internal-subset entity references
//!   within the [`ParseLimits`] budget,
//! - merges text, CDATA and references into one text run,
//! - enforces the element nesting limit,
//! - normalizes CR/CRLF line ends in character data.

use crate::core::entities::{EntityResolver, EntityTable};
use crate::core::error::{ErnError, ErnResult, SecurityViolation};
use crate::core::namespace::{ns, split_qname, NamespaceScope};
use crate::core::node::{is_xml_whitespace, Attribute};
use crate::core::parser::ParseLimits;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::io::BufRead;

/// An element start with its names resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Source prefix
    pub prefix: Option<String>,
    /// Local name
    pub local_name: String,
    /// Resolved namespace URI
    pub namespace: Option<String>,
    /// Attributes with resolved namespaces, declarations excluded
    pub attributes: Vec<Attribute>,
}

impl StartTag {
    /// Value of the un-namespaced attribute `local_name`
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

/// One unit of document content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Element start (empty elements produce a start and an end)
    Start(StartTag),
    /// Element end
    End,
    /// Character data with references resolved
    Text(String),
    /// Comment body
    Comment(String),
    /// End of input
    Eof,
}

/// Pull tokenizer over any buffered reader
pub struct Tokenizer<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    scope: NamespaceScope,
    resolver: EntityResolver,
    limits: ParseLimits,
    depth: usize,
    seen_root: bool,
    text: String,
    pending: VecDeque<Token>,
}

impl<R: BufRead> Tokenizer<R> {
    /// Create a tokenizer over UTF-8 input
    pub fn new(source: R, limits: ParseLimits) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            scope: NamespaceScope::new(),
            resolver: EntityResolver::new(limits.entity_limits()),
            limits,
            depth: 0,
            seen_root: false,
            text: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// Byte offset of the reader in the input
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Current element depth (1 inside the root element)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes produced by entity expansion so far
    pub fn expanded_bytes(&self) -> usize {
        self.resolver.expanded_bytes()
    }

    /// Read the next token
    pub fn next_token(&mut self) -> ErnResult<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }
        loop {
            let mut buf = std::mem::take(&mut self.buf);
            buf.clear();
            let event = self
                .reader
                .read_event_into(&mut buf)
                .map_err(|e| locate(e.into(), self.reader.buffer_position() as u64))?;
            let position = self.reader.buffer_position() as u64;
            let token = self.handle(event, position)?;
            self.buf = buf;
            if let Some(token) = token {
                return Ok(token);
            }
        }
    }

    /// Turn one reader event into a token, or `None` to keep reading
    fn handle(&mut self, event: Event<'_>, position: u64) -> ErnResult<Option<Token>> {
        match event {
            Event::Text(e) => {
                let raw = normalize_line_ends(utf8(&e, position)?);
                let text = self
                    .resolver
                    .unescape(&raw, false)
                    .map_err(|err| locate(err, position))?;
                self.text.push_str(&text);
                return Ok(None);
            }
            Event::CData(e) => {
                let raw = normalize_line_ends(utf8(&e, position)?);
                self.text.push_str(&raw);
                return Ok(None);
            }
            Event::GeneralRef(e) => {
                let name = utf8(&e, position)?;
                self.resolver
                    .resolve_reference(name, &mut self.text)
                    .map_err(|err| locate(err, position))?;
                return Ok(None);
            }
            Event::Decl(e) => {
                if let Some(Ok(encoding)) = e.encoding() {
                    let label = String::from_utf8_lossy(&encoding);
                    if !crate::core::encoding::is_supported_label(&label) {
                        return Err(ErnError::syntax(
                            format!("unsupported encoding '{}'", label),
                            position,
                        ));
                    }
                }
                return Ok(None);
            }
            Event::DocType(e) => {
                if self.seen_root {
                    return Err(ErnError::syntax("DOCTYPE after root element", position));
                }
                let doctype = utf8(&e, position)?;
                let table = EntityTable::from_doctype(doctype, &self.limits.entity_limits())
                    .map_err(|err| locate(err, position))?;
                self.resolver.declare(table);
                return Ok(None);
            }
            Event::PI(_) => return Ok(None),
            _ => {}
        }

        // structural event: character data collected so far comes first
        let text = self.flush_text(position)?;
        let token = match event {
            Event::Start(e) => self.start(&e, position)?,
            Event::Empty(e) => {
                let token = self.start(&e, position)?;
                self.end();
                self.pending.push_back(Token::End);
                token
            }
            Event::End(_) => {
                self.end();
                Token::End
            }
            Event::Comment(e) => Token::Comment(utf8(&e, position)?.to_string()),
            Event::Eof => {
                if self.depth > 0 {
                    return Err(ErnError::syntax("unexpected end of input", position));
                }
                if !self.seen_root {
                    return Err(ErnError::syntax("no root element", position));
                }
                Token::Eof
            }
            _ => return Ok(text),
        };
        match text {
            Some(text) => {
                self.pending.push_front(token);
                Ok(Some(text))
            }
            None => Ok(Some(token)),
        }
    }

    /// Emit pending character data, rejecting content outside the root
    fn flush_text(&mut self, position: u64) -> ErnResult<Option<Token>> {
        if self.text.is_empty() {
            return Ok(None);
        }
        let text = std::mem::take(&mut self.text);
        if self.depth == 0 {
            if !is_xml_whitespace(&text) {
                return Err(ErnError::syntax("text outside the root element", position));
            }
            return Ok(None);
        }
        Ok(Some(Token::Text(text)))
    }

    fn start(&mut self, e: &BytesStart<'_>, position: u64) -> ErnResult<Token> {
        if self.depth == 0 && self.seen_root {
            return Err(ErnError::syntax("multiple root elements", position));
        }
        self.seen_root = true;
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(SecurityViolation::NestingDepth {
                limit: self.limits.max_depth,
            }
            .into());
        }

        let mut bindings = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| ErnError::syntax(err.to_string(), position))?;
            let key = utf8(attr.key.as_ref(), position)?.to_string();
            let raw = utf8(&attr.value, position)?;
            let value = self
                .resolver
                .unescape(raw, true)
                .map_err(|err| locate(err, position))?;
            if key == "xmlns" {
                bindings.push((None, (!value.is_empty()).then_some(value)));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(ErnError::syntax(
                        format!("prefix '{}' bound to an empty namespace", prefix),
                        position,
                    ));
                }
                bindings.push((Some(prefix.to_string()), Some(value)));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scope.push(bindings);

        let qname = utf8(e.name().into_inner(), position)?;
        let (prefix, local_name) = split_qname(qname);
        let namespace = self.resolve(prefix, position)?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let (attr_prefix, attr_local) = split_qname(&key);
            let attr_ns = match attr_prefix {
                None => None,
                Some(p) => self.resolve(Some(p), position)?,
            };
            if attributes
                .iter()
                .any(|a: &Attribute| a.is(attr_ns.as_deref(), attr_local))
            {
                return Err(ErnError::syntax(
                    format!("duplicate attribute '{}'", key),
                    position,
                ));
            }
            attributes.push(Attribute {
                prefix: attr_prefix.map(str::to_string),
                local_name: attr_local.to_string(),
                namespace: attr_ns,
                value,
            });
        }

        Ok(Token::Start(StartTag {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace,
            attributes,
        }))
    }

    fn end(&mut self) {
        self.scope.pop();
        self.depth = self.depth.saturating_sub(1);
    }

    fn resolve(&self, prefix: Option<&str>, position: u64) -> ErnResult<Option<String>> {
        match (prefix, self.scope.resolve(prefix)) {
            (_, Some(uri)) => Ok(Some(uri.to_string())),
            (None, None) => Ok(None),
            (Some(p), None) if p == "xmlns" => Ok(Some(ns::XMLNS.to_string())),
            (Some(p), None) => Err(ErnError::syntax(
                format!("unbound namespace prefix '{}'", p),
                position,
            )),
        }
    }
}

fn utf8(bytes: &[u8], position: u64) -> ErnResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| ErnError::syntax(format!("invalid UTF-8: {}", e), position))
}

/// Apply XML end-of-line handling to raw character data
fn normalize_line_ends(raw: &str) -> std::borrow::Cow<'_, str> {
    if raw.contains('\r') {
        std::borrow::Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        std::borrow::Cow::Borrowed(raw)
    }
}

/// Attach a byte position to errors raised without one
fn locate(err: ErnError, position: u64) -> ErnError {
    match err {
        ErnError::Syntax { message, position: 0 } => ErnError::Syntax { message, position },
        other => other,
    }
}
