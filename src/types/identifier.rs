//! Identifier types for ERN entities
//!
//! Identifiers (ISRC, ICPN, GRid, ISNI, ...) appear in many places of an ERN
//! message. The model keeps their text exactly as written; this module adds a
//! typed view with format checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// International Standard Recording Code
    Isrc,
    /// International Code Product Number (UPC / EAN)
    Icpn,
    /// Global Release Identifier
    GRid,
    /// Label catalog number
    CatalogNumber,
    /// Namespaced proprietary identifier
    ProprietaryId,
    /// International Standard Name Identifier
    Isni,
    /// DDEX Party Identifier
    Dpid,
    /// Any other element name
    Other(String),
}

impl IdentifierKind {
    /// Kind named by an ERN element local name
    pub fn from_element_name(name: &str) -> Self {
        match name {
            "ISRC" => Self::Isrc,
            "ICPN" | "EAN" | "UPC" => Self::Icpn,
            "GRid" => Self::GRid,
            "CatalogNumber" => Self::CatalogNumber,
            "ProprietaryId" => Self::ProprietaryId,
            "ISNI" => Self::Isni,
            "DPID" => Self::Dpid,
            other => Self::Other(other.to_string()),
        }
    }

    /// ERN element local name for this kind
    pub fn element_name(&self) -> &str {
        match self {
            Self::Isrc => "ISRC",
            Self::Icpn => "ICPN",
            Self::GRid => "GRid",
            Self::CatalogNumber => "CatalogNumber",
            Self::ProprietaryId => "ProprietaryId",
            Self::Isni => "ISNI",
            Self::Dpid => "DPID",
            Self::Other(name) => name,
        }
    }
}

/// A typed identifier value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier kind
    pub kind: IdentifierKind,
    /// The value, as written
    pub value: String,
    /// `Namespace` attribute of proprietary identifiers
    pub namespace: Option<String>,
}

impl Identifier {
    /// Create an identifier without a namespace
    pub fn new(kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            namespace: None,
        }
    }

    /// Create a namespaced proprietary identifier
    pub fn proprietary(namespace: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::ProprietaryId,
            value: value.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Whether the value is well formed for its kind
    ///
    /// Kinds without a fixed format are always valid.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            IdentifierKind::Isrc => is_valid_isrc(&self.value),
            IdentifierKind::Icpn => is_valid_icpn(&self.value),
            IdentifierKind::GRid => is_valid_grid(&self.value),
            IdentifierKind::Isni => is_valid_isni(&self.value),
            _ => !self.value.trim().is_empty(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}:{}={}", self.kind.element_name(), namespace, self.value),
            None => write!(f, "{}={}", self.kind.element_name(), self.value),
        }
    }
}

/// Check an ISRC (`CC-XXX-YY-NNNNN`, hyphens optional)
pub fn is_valid_isrc(value: &str) -> bool {
    let compact: Vec<u8> = value.bytes().filter(|b| *b != b'-').collect();
    compact.len() == 12
        && compact[..2].iter().all(u8::is_ascii_uppercase)
        && compact[2..5]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && compact[5..].iter().all(u8::is_ascii_digit)
}

/// Check an ICPN: 12-digit UPC-A or 13-digit EAN with a valid GS1 check digit
pub fn is_valid_icpn(value: &str) -> bool {
    let digits: Option<Vec<u32>> = value.chars().map(|c| c.to_digit(10)).collect();
    match digits {
        Some(digits) if digits.len() == 12 || digits.len() == 13 => gs1_check(&digits),
        _ => false,
    }
}

fn gs1_check(digits: &[u32]) -> bool {
    let Some((check, body)) = digits.split_last() else {
        return false;
    };
    // weights alternate 3, 1 starting from the digit next to the check digit
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();
    (10 - sum % 10) % 10 == *check
}

/// Check a GRid: 18 alphanumerics, hyphens optional
pub fn is_valid_grid(value: &str) -> bool {
    let compact: Vec<char> = value.chars().filter(|c| *c != '-').collect();
    compact.len() == 18 && compact.iter().all(|c| c.is_ascii_alphanumeric())
}

/// Check an ISNI: 15 digits followed by a digit or `X`, spaces optional
pub fn is_valid_isni(value: &str) -> bool {
    let compact: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() == 16
        && compact[..15].iter().all(char::is_ascii_digit)
        && (compact[15].is_ascii_digit() || compact[15] == 'X')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isrc() {
        assert!(is_valid_isrc("USRC17607839"));
        assert!(is_valid_isrc("US-RC1-76-07839"));
        assert!(!is_valid_isrc("usrc17607839"));
        assert!(!is_valid_isrc("USRC1760783"));
    }

    #[test]
    fn test_icpn_check_digit() {
        assert!(is_valid_icpn("036000291452"));
        assert!(is_valid_icpn("4006381333931"));
        assert!(!is_valid_icpn("4006381333932"));
        assert!(!is_valid_icpn("40063813339"));
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier::proprietary("PADPIDA1", "X-9");
        assert_eq!(id.to_string(), "ProprietaryId:PADPIDA1=X-9");
        assert!(id.is_valid());
        assert_eq!(
            IdentifierKind::from_element_name("UPC"),
            IdentifierKind::Icpn
        );
    }
}
