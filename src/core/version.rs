//! ERN schema versions and version detection

use crate::core::error::{ErnError, ErnResult};
use crate::core::namespace::ns;
use crate::core::tokenizer::{Token, Tokenizer};
use crate::core::parser::ParseLimits;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported ERN schema versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// ERN 3.8.2
    #[serde(rename = "3.8.2")]
    Ern382,
    /// ERN 4.2
    #[serde(rename = "4.2")]
    Ern42,
    /// ERN 4.3
    #[serde(rename = "4.3")]
    Ern43,
}

impl SchemaVersion {
    /// All supported versions, oldest first
    pub const ALL: [SchemaVersion; 3] = [Self::Ern382, Self::Ern42, Self::Ern43];

    /// Namespace URI of the message schema
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Ern382 => ns::ERN_382,
            Self::Ern42 => ns::ERN_42,
            Self::Ern43 => ns::ERN_43,
        }
    }

    /// Value of the `MessageSchemaVersionId` root attribute
    pub fn schema_version_id(&self) -> &'static str {
        match self {
            Self::Ern382 => "ern/382",
            Self::Ern42 => "ern/42",
            Self::Ern43 => "ern/43",
        }
    }

    /// `xsi:schemaLocation` value for the release notification schema
    pub fn schema_location(&self) -> String {
        format!(
            "{} {}/release-notification.xsd",
            self.namespace(),
            self.namespace()
        )
    }

    /// Whether this is one of the 4.x versions
    pub fn is_4x(&self) -> bool {
        !matches!(self, Self::Ern382)
    }

    /// Version whose schema namespace is `uri`
    pub fn from_namespace(uri: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.namespace() == uri.trim_end_matches('/'))
    }

    /// Version named by a `MessageSchemaVersionId` value (`ern/43`, `/ern/382`, `4.3`)
    pub fn from_schema_version_id(id: &str) -> Option<Self> {
        let id = id.trim().trim_start_matches('/');
        let id = id.strip_prefix("ern/").unwrap_or(id);
        match id {
            "382" | "3.8.2" => Some(Self::Ern382),
            "42" | "4.2" => Some(Self::Ern42),
            "43" | "4.3" => Some(Self::Ern43),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ern382 => write!(f, "ERN 3.8.2"),
            Self::Ern42 => write!(f, "ERN 4.2"),
            Self::Ern43 => write!(f, "ERN 4.3"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = ErnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_schema_version_id(s)
            .or_else(|| Self::from_namespace(s))
            .ok_or_else(|| ErnError::SchemaVersionUnknown(s.to_string()))
    }
}

/// Version implied by a root element's namespace and attributes
pub(crate) fn version_of_root(
    namespace: Option<&str>,
    schema_version_id: Option<&str>,
) -> ErnResult<SchemaVersion> {
    if let Some(version) = namespace.and_then(SchemaVersion::from_namespace) {
        return Ok(version);
    }
    if let Some(version) = schema_version_id.and_then(SchemaVersion::from_schema_version_id) {
        return Ok(version);
    }
    Err(ErnError::SchemaVersionUnknown(
        namespace
            .or(schema_version_id)
            .unwrap_or("<no namespace>")
            .to_string(),
    ))
}

/// Detect the ERN version of a document by reading only up to its root element
pub fn detect_version(input: &[u8]) -> ErnResult<SchemaVersion> {
    let utf8 = crate::core::encoding::convert_to_utf8(input)?;
    let mut tokenizer = Tokenizer::new(utf8.as_ref(), ParseLimits::default());
    loop {
        match tokenizer.next_token()? {
            Token::Start(start) => {
                return version_of_root(
                    start.namespace.as_deref(),
                    start.attribute("MessageSchemaVersionId"),
                );
            }
            Token::Eof => {
                return Err(ErnError::syntax("no root element", tokenizer.position()))
            }
            _ => {}
        }
    }
}
