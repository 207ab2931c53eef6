//! Entity and character reference handling
//!
//! The internal DTD subset may declare general entities. Only internal,
//! text-only entities are accepted; every expansion is charged against a
//! per-document byte budget and a nesting limit so that "billion laughs"
//! style inputs fail with a security error instead of exhausting memory.

use crate::core::error::{ErnError, ErnResult, SecurityViolation};
use std::collections::HashMap;

/// Bounds applied to entity declaration and expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLimits {
    /// Total bytes entity expansion may produce over one document
    pub max_expansion_bytes: usize,
    /// Maximum depth of entity references inside entity values
    pub max_nesting: usize,
    /// Maximum number of declared entities
    pub max_declarations: usize,
}

/// General entities declared in a document's internal subset
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: HashMap<String, String>,
}

impl EntityTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is declared
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Replacement text of a declared entity
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(|s| s.as_str())
    }

    /// Collect entity declarations from the content of a `<!DOCTYPE ...>`
    ///
    /// External and parameter entities are rejected. The first declaration of
    /// a name wins, as in XML.
    pub fn from_doctype(doctype: &str, limits: &EntityLimits) -> ErnResult<Self> {
        let mut table = Self::new();
        let Some(open) = doctype.find('[') else {
            return Ok(table);
        };
        let subset = match doctype.rfind(']') {
            Some(close) if close > open => &doctype[open + 1..close],
            _ => &doctype[open + 1..],
        };

        let mut rest = subset;
        let mut declared = 0usize;
        while let Some(pos) = rest.find(['<', '%']) {
            rest = &rest[pos..];
            if rest.starts_with('%') {
                let name = rest[1..].split(';').next().unwrap_or_default();
                return Err(SecurityViolation::ParameterEntity(name.to_string()).into());
            }
            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.split_once("-->").map(|(_, r)| r).unwrap_or("");
                continue;
            }
            if let Some(after) = rest.strip_prefix("<!ENTITY") {
                declared += 1;
                if declared > limits.max_declarations {
                    return Err(SecurityViolation::TooManyEntities {
                        limit: limits.max_declarations,
                    }
                    .into());
                }
                let (name, value, remaining) = parse_entity_decl(after)?;
                table.entities.entry(name).or_insert(value);
                rest = remaining;
                continue;
            }
            rest = skip_markup_decl(rest);
        }
        Ok(table)
    }
}

/// Parse the part of an entity declaration that follows `<!ENTITY`
///
/// Returns `(name, value, rest_after_decl)`.
fn parse_entity_decl(decl: &str) -> ErnResult<(String, String, &str)> {
    let decl = decl.trim_start();
    if let Some(pe) = decl.strip_prefix('%') {
        let name = pe.split_whitespace().next().unwrap_or_default();
        return Err(SecurityViolation::ParameterEntity(name.to_string()).into());
    }
    let name_end = decl
        .find(|c: char| c.is_whitespace())
        .ok_or_else(|| ErnError::syntax("truncated entity declaration", 0))?;
    let name = &decl[..name_end];
    let body = decl[name_end..].trim_start();

    let quote = body
        .chars()
        .next()
        .ok_or_else(|| ErnError::syntax("truncated entity declaration", 0))?;
    if quote != '"' && quote != '\'' {
        if body.starts_with("SYSTEM") || body.starts_with("PUBLIC") {
            return Err(SecurityViolation::ExternalEntity(name.to_string()).into());
        }
        return Err(ErnError::syntax(
            format!("malformed declaration of entity '{}'", name),
            0,
        ));
    }
    let value_end = body[1..]
        .find(quote)
        .ok_or_else(|| ErnError::syntax("unterminated entity value", 0))?;
    let value = &body[1..1 + value_end];
    if value.contains('<') {
        return Err(ErnError::syntax(
            format!("entity '{}' contains markup", name),
            0,
        ));
    }
    let after_value = &body[1 + value_end + 1..];
    let close = after_value
        .find('>')
        .ok_or_else(|| ErnError::syntax("unterminated entity declaration", 0))?;
    Ok((name.to_string(), value.to_string(), &after_value[close + 1..]))
}

/// Skip one `<!...>`/`<?...?>` declaration, respecting quoted strings
fn skip_markup_decl(decl: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in decl.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return &decl[i + 1..],
            _ => {}
        }
    }
    ""
}

/// Check if a code point is a valid XML 1.0 Char
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Decode the body of a character reference (`#123` or `#x7B`)
pub fn decode_char_ref(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let codepoint = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

fn predefined(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// Resolves references against an [`EntityTable`] within a byte budget
///
/// One resolver is used for a whole document, so the budget bounds the total
/// expansion however the references are spread over the input.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    table: EntityTable,
    limits: EntityLimits,
    expanded: usize,
}

impl EntityResolver {
    /// Create a resolver with no declared entities
    pub fn new(limits: EntityLimits) -> Self {
        Self {
            table: EntityTable::new(),
            limits,
            expanded: 0,
        }
    }

    /// Install the entities declared by the document's DOCTYPE
    pub fn declare(&mut self, table: EntityTable) {
        self.table = table;
    }

    /// Bytes produced by custom entity expansion so far
    pub fn expanded_bytes(&self) -> usize {
        self.expanded
    }

    /// Append the replacement text of `&name;` to `out`
    pub fn resolve_reference(&mut self, name: &str, out: &mut String) -> ErnResult<()> {
        if name.starts_with('#') {
            let c = decode_char_ref(name).ok_or_else(|| {
                ErnError::syntax(format!("invalid character reference '&{};'", name), 0)
            })?;
            out.push(c);
            return Ok(());
        }
        if let Some(c) = predefined(name) {
            out.push(c);
            return Ok(());
        }
        let mut stack = Vec::new();
        self.expand(name, &mut stack, out)
    }

    fn expand(&mut self, name: &str, stack: &mut Vec<String>, out: &mut String) -> ErnResult<()> {
        if stack.iter().any(|open| open == name) {
            return Err(SecurityViolation::RecursiveEntity(name.to_string()).into());
        }
        if stack.len() >= self.limits.max_nesting {
            return Err(SecurityViolation::EntityNesting {
                limit: self.limits.max_nesting,
            }
            .into());
        }
        self.charge(1)?;
        let value = self
            .table
            .get(name)
            .ok_or_else(|| ErnError::syntax(format!("undefined entity '&{};'", name), 0))?
            .to_string();

        stack.push(name.to_string());
        let mut rest = value.as_str();
        while let Some(amp) = rest.find('&') {
            self.charge(amp)?;
            out.push_str(&rest[..amp]);
            let end = rest[amp..]
                .find(';')
                .ok_or_else(|| ErnError::syntax("unterminated reference in entity", 0))?;
            let inner = &rest[amp + 1..amp + end];
            if inner.starts_with('#') || predefined(inner).is_some() {
                self.charge(1)?;
                self.resolve_reference(inner, out)?;
            } else {
                self.expand(inner, stack, out)?;
            }
            rest = &rest[amp + end + 1..];
        }
        self.charge(rest.len())?;
        out.push_str(rest);
        stack.pop();
        Ok(())
    }

    fn charge(&mut self, bytes: usize) -> ErnResult<()> {
        self.expanded = self.expanded.saturating_add(bytes);
        if self.expanded > self.limits.max_expansion_bytes {
            return Err(SecurityViolation::EntityExpansion {
                limit: self.limits.max_expansion_bytes,
            }
            .into());
        }
        Ok(())
    }

    /// Resolve every reference in raw (escaped) text
    ///
    /// With `attribute` set, literal tab/CR/LF are normalized to spaces as XML
    /// attribute-value normalization requires.
    pub fn unescape(&mut self, raw: &str, attribute: bool) -> ErnResult<String> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            push_literal(&mut out, &rest[..amp], attribute);
            let end = rest[amp..]
                .find(';')
                .ok_or_else(|| ErnError::syntax("unterminated entity reference", 0))?;
            self.resolve_reference(&rest[amp + 1..amp + end], &mut out)?;
            rest = &rest[amp + end + 1..];
        }
        push_literal(&mut out, rest, attribute);
        Ok(out)
    }
}

fn push_literal(out: &mut String, literal: &str, attribute: bool) {
    if attribute {
        out.extend(literal.chars().map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c => c,
        }));
    } else {
        out.push_str(literal);
    }
}
