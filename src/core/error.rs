//! Error types for ERN operations
//!
//! This module defines all error types used throughout ERNKit. Fatal
//! conditions are variants of [`ErnError`]; non-fatal conditions found while
//! parsing (such as dangling references) are reported as [`ParseWarning`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of resource bound that a hostile or oversized input exceeded
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SecurityViolation {
    /// Element nesting deeper than the configured maximum
    #[error("element nesting exceeds {limit}")]
    NestingDepth { limit: usize },
    /// Total bytes produced by entity expansion exceeded the budget
    #[error("entity expansion exceeds {limit} bytes")]
    EntityExpansion { limit: usize },
    /// Entity references nested deeper than allowed
    #[error("entity nesting exceeds {limit}")]
    EntityNesting { limit: usize },
    /// An entity refers to itself, directly or indirectly
    #[error("entity '{0}' is recursive")]
    RecursiveEntity(String),
    /// Too many entity declarations in the internal subset
    #[error("more than {limit} entity declarations")]
    TooManyEntities { limit: usize },
    /// External (SYSTEM/PUBLIC) entities are never fetched
    #[error("external entity '{0}' rejected")]
    ExternalEntity(String),
    /// Parameter entities are not supported
    #[error("parameter entity '{0}' rejected")]
    ParameterEntity(String),
}

/// Error types for ERN operations
#[derive(Debug, Error)]
pub enum ErnError {
    /// Malformed XML
    #[error("Syntax error at byte {position}: {message}")]
    Syntax { message: String, position: u64 },

    /// A resource bound was exceeded while reading the input
    #[error("Security error: {0}")]
    Security(#[from] SecurityViolation),

    /// The document is not an ERN message of a supported version
    #[error("Unknown schema version: {0}")]
    SchemaVersionUnknown(String),

    /// An extension could not be placed back into the rebuilt document
    #[error("Extension {namespace}:{name} lost its anchor {path}")]
    ExtensionAnchorLost {
        namespace: String,
        name: String,
        path: String,
    },

    /// Required fields are missing from the message being built
    #[error("Build incomplete, missing: {}", missing.join(", "))]
    BuildIncomplete { missing: Vec<String> },

    /// The builder was asked to reopen a section it already left
    #[error("Section order violation: cannot write {to} after {from}")]
    SectionOrder { from: String, to: String },

    /// Strict preflight found warnings
    #[error("Preflight failed with {} warning(s): {}", warnings.len(), warnings.join("; "))]
    PreflightFailed { warnings: Vec<String> },

    /// Conversion between schema versions was requested
    #[error("Cannot convert a {from} message to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Identical input produced different output across builds
    #[error("Determinism violation after {iterations} builds: {first} != {mismatch}")]
    DeterminismViolation {
        iterations: usize,
        first: String,
        mismatch: String,
    },

    /// IO error from a caller-supplied source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErnError {
    pub(crate) fn syntax(message: impl Into<String>, position: u64) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Whether this error signals a broken internal invariant rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DeterminismViolation { .. })
    }
}

impl From<quick_xml::Error> for ErnError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Self::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Self::syntax(other.to_string(), 0),
        }
    }
}

/// Result type alias for ERN operations
pub type ErnResult<T> = Result<T, ErnError>;

/// Error type returned by parsing entry points
pub type ParseError = ErnError;

/// Error type returned by building entry points
pub type BuildError = ErnError;

/// Non-fatal finding recorded while building the structured model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseWarning {
    /// A reference string that names no entity of the expected kind
    DanglingReference {
        /// Kind of entity the reference should point at
        target: String,
        /// The unresolved key
        reference: String,
        /// Entity holding the reference
        from: String,
    },
    /// An entity without its reference key
    MissingReference { entity: String, index: usize },
    /// Two entities share one reference key; the first wins
    DuplicateReference { target: String, reference: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                target,
                reference,
                from,
            } => write!(f, "dangling {} reference '{}' in {}", target, reference, from),
            Self::MissingReference { entity, index } => {
                write!(f, "{} #{} has no reference", entity, index)
            }
            Self::DuplicateReference { target, reference } => {
                write!(f, "duplicate {} reference '{}'", target, reference)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ErnError::syntax("unexpected end", 42);
        assert!(err.to_string().contains("byte 42"));

        let err = ErnError::BuildIncomplete {
            missing: vec!["MessageId".to_string(), "ISRC".to_string()],
        };
        assert_eq!(err.to_string(), "Build incomplete, missing: MessageId, ISRC");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ErnError = io_err.into();
        assert!(matches!(err, ErnError::Io(_)));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_security_display() {
        let err: ErnError = SecurityViolation::EntityExpansion { limit: 1024 }.into();
        assert_eq!(
            err.to_string(),
            "Security error: entity expansion exceeds 1024 bytes"
        );
    }

    #[test]
    fn test_violation_is_a_source() {
        use std::error::Error as _;
        let err: ErnError = SecurityViolation::ExternalEntity("xxe".to_string()).into();
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("external entity 'xxe' rejected".to_string())
        );
    }

    #[test]
    fn test_determinism_is_internal() {
        let err = ErnError::DeterminismViolation {
            iterations: 3,
            first: "aa".to_string(),
            mismatch: "bb".to_string(),
        };
        assert!(err.is_internal());
    }
}
