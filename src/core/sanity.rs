//! Structural pre-check
//!
//! [`sanity_check`] reads the input once with the tokenizer and reports
//! whether it looks like a supported ERN message, without building a tree or
//! a model. Failures are reported in the result rather than returned as
//! errors.

use crate::core::encoding::convert_to_utf8;
use crate::core::error::ErnResult;
use crate::core::namespace::KnownNamespaces;
use crate::core::parser::ParseLimits;
use crate::core::tokenizer::{Token, Tokenizer};
use crate::core::version::{version_of_root, SchemaVersion};
use serde::Serialize;

/// Sections a message is expected to carry
const EXPECTED_SECTIONS: [&str; 3] = ["MessageHeader", "ResourceList", "ReleaseList"];

/// Result of a structural pre-check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanityReport {
    /// No errors were found
    pub is_valid: bool,
    /// Version of the root, when recognised
    pub version: Option<SchemaVersion>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Elements read before the check ended
    pub element_count: usize,
}

/// Check that `input` is well-formed, within limits and rooted in a supported
/// ERN namespace
pub fn sanity_check(input: &[u8]) -> SanityReport {
    let mut report = SanityReport {
        is_valid: false,
        version: None,
        errors: Vec::new(),
        warnings: Vec::new(),
        element_count: 0,
    };
    if let Err(error) = scan(input, &mut report) {
        report.errors.push(error.to_string());
    }
    report.is_valid = report.errors.is_empty();
    tracing::debug!(
        valid = report.is_valid,
        elements = report.element_count,
        "sanity check"
    );
    report
}

fn scan(input: &[u8], report: &mut SanityReport) -> ErnResult<()> {
    let utf8 = convert_to_utf8(input)?;
    let mut tokenizer = Tokenizer::new(utf8.as_ref(), ParseLimits::default());
    let mut known: Option<KnownNamespaces> = None;
    let mut sections = Vec::new();
    let mut extensions = 0usize;
    let mut depth = 0usize;

    loop {
        match tokenizer.next_token()? {
            Token::Start(start) => {
                report.element_count += 1;
                depth += 1;
                match &known {
                    None => {
                        let version = version_of_root(
                            start.namespace.as_deref(),
                            start.attribute("MessageSchemaVersionId"),
                        )?;
                        report.version = Some(version);
                        if start.local_name != "NewReleaseMessage" {
                            report
                                .warnings
                                .push(format!("root element is {}", start.local_name));
                        }
                        known = Some(KnownNamespaces::new(
                            start
                                .namespace
                                .clone()
                                .unwrap_or_else(|| version.namespace().to_string()),
                        ));
                    }
                    Some(known) => {
                        if !known.contains(start.namespace.as_deref()) {
                            extensions += 1;
                        } else if depth == 2 {
                            sections.push(start.local_name);
                        }
                    }
                }
            }
            Token::End => depth = depth.saturating_sub(1),
            Token::Eof => break,
            _ => {}
        }
    }

    for section in EXPECTED_SECTIONS {
        if !sections.iter().any(|s| s == section) {
            report.warnings.push(format!("missing {}", section));
        }
    }
    if extensions > 0 {
        report
            .warnings
            .push(format!("{} extension element(s) outside the schema", extensions));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_message() {
        let xml = br#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/382" xmlns:x="urn:x">
  <MessageHeader/><ResourceList><x:Tag/></ResourceList><ReleaseList/>
</ern:NewReleaseMessage>"#;
        let report = sanity_check(xml);
        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(report.version, Some(SchemaVersion::Ern382));
        assert_eq!(report.element_count, 5);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_missing_sections_are_warnings() {
        let report = sanity_check(br#"<NewReleaseMessage xmlns="http://ddex.net/xml/ern/43"/>"#);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 3);
    }

    #[test]
    fn test_malformed_and_unknown() {
        let report = sanity_check(b"<NewReleaseMessage xmlns=\"http://ddex.net/xml/ern/43\"><a></b>");
        assert!(!report.is_valid);

        let report = sanity_check(b"<Catalog/>");
        assert!(!report.is_valid);
        assert_eq!(report.version, None);

        let report = sanity_check(b"");
        assert!(!report.is_valid);
    }
}
