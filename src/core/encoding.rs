//! Input encoding detection
//!
//! ERN messages are UTF-8 in practice. UTF-16 input is recognised by its byte
//! order mark (or the `<\0` / `\0<` pattern) and converted to UTF-8 before
//! tokenizing; everything else is read as UTF-8.

use crate::core::error::{ErnError, ErnResult};
use std::borrow::Cow;

/// Encoding of raw XML input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        match input {
            [0xFF, 0xFE, ..] | [b'<', 0x00, ..] => XmlEncoding::Utf16Le,
            [0xFE, 0xFF, ..] | [0x00, b'<', ..] => XmlEncoding::Utf16Be,
            _ => XmlEncoding::Utf8,
        }
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Whether an XML declaration may name this encoding for our decoded input
pub(crate) fn is_supported_label(label: &str) -> bool {
    matches!(
        label.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii" | "utf-16" | "utf-16le" | "utf-16be"
    )
}

/// Convert input to UTF-8 bytes, stripping any byte order mark
///
/// Borrows when the input is already UTF-8.
pub fn convert_to_utf8(input: &[u8]) -> ErnResult<Cow<'_, [u8]>> {
    match XmlEncoding::detect(input) {
        XmlEncoding::Utf8 => Ok(Cow::Borrowed(
            input.strip_prefix(UTF8_BOM).unwrap_or(input),
        )),
        XmlEncoding::Utf16Le => {
            let bytes = input.strip_prefix(&[0xFF, 0xFE]).unwrap_or(input);
            decode_utf16(bytes, u16::from_le_bytes).map(Cow::Owned)
        }
        XmlEncoding::Utf16Be => {
            let bytes = input.strip_prefix(&[0xFE, 0xFF]).unwrap_or(input);
            decode_utf16(bytes, u16::from_be_bytes).map(Cow::Owned)
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> ErnResult<Vec<u8>> {
    if bytes.len() % 2 != 0 {
        return Err(ErnError::syntax(
            "invalid UTF-16: odd number of bytes",
            bytes.len() as u64,
        ));
    }
    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16(&code_units)
        .map(String::into_bytes)
        .map_err(|e| ErnError::syntax(format!("invalid UTF-16: {}", e), 0))
}
