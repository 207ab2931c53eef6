//! Message builder
//!
//! The builder turns a [`StructuredMessage`] back into ERN XML. It lays the
//! root's children out in section order through a [`MessageAssembler`], puts
//! captured extensions back at their anchors and writes the tree with the
//! canonical rules, so its output is already canonical.
//!
//! ```no_run
//! use ernkit::{BuildOptions, Builder, ParseOptions, StructuredMessage};
//!
//! let input = std::fs::read("release.xml").unwrap();
//! let message = StructuredMessage::parse(&input, &ParseOptions::default()).unwrap();
//! let report = Builder::new(BuildOptions::default()).build_report(&message).unwrap();
//! println!("{} bytes, sha256 {}", report.xml.len(), report.sha256);
//! ```

mod assembler;
mod options;
mod preset;

pub use assembler::{BuildState, MessageAssembler};
pub use options::{BuildOptions, PreflightLevel};
pub use preset::Preset;

use crate::core::canonical::{active_namespace, canonical_transform, sha256};
use crate::core::error::{ErnError, ErnResult, ParseWarning};
use crate::core::extension::reinsert;
use crate::core::message::{MessageRoot, StructuredMessage, TopLevel};
use crate::core::node::{Element, Node};
use crate::core::serializer::XmlSerializer;
use serde::Serialize;

/// A non-fatal finding while building
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    /// Stable machine-readable code
    pub code: String,
    pub message: String,
    /// Document path the warning refers to
    pub location: Option<String>,
}

/// Output of a build with its digest and warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    #[serde(skip)]
    pub xml: Vec<u8>,
    /// Hex SHA-256 of `xml`
    pub sha256: String,
    pub element_count: usize,
    pub warnings: Vec<BuildWarning>,
}

/// Builds ERN XML from structured messages
#[derive(Debug, Clone, Default)]
pub struct Builder {
    options: BuildOptions,
}

impl Builder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build `message` into bytes
    pub fn build(&self, message: &StructuredMessage) -> ErnResult<Vec<u8>> {
        Ok(self.build_report(message)?.xml)
    }

    /// Build `message`, returning the bytes with their digest and warnings
    pub fn build_report(&self, message: &StructuredMessage) -> ErnResult<BuildReport> {
        self.check_version(message)?;
        if self.options.preflight != PreflightLevel::None {
            self.check_required(message)?;
        }

        let report = self.build_once(message)?;
        if self.options.preflight == PreflightLevel::Strict && !report.warnings.is_empty() {
            return Err(ErnError::PreflightFailed {
                warnings: report.warnings.iter().map(|w| w.message.clone()).collect(),
            });
        }
        if let Some(iterations) = self.options.verify_determinism.filter(|n| *n > 1) {
            for i in 1..iterations {
                let again = self.build_once(message)?;
                if again.sha256 != report.sha256 {
                    tracing::error!(
                        iteration = i + 1,
                        first = %report.sha256,
                        mismatch = %again.sha256,
                        "non-deterministic build"
                    );
                    return Err(ErnError::DeterminismViolation {
                        iterations: i + 1,
                        first: report.sha256,
                        mismatch: again.sha256,
                    });
                }
            }
        }
        tracing::debug!(
            bytes = report.xml.len(),
            elements = report.element_count,
            warnings = report.warnings.len(),
            sha256 = %report.sha256,
            "built message"
        );
        Ok(report)
    }

    fn check_version(&self, message: &StructuredMessage) -> ErnResult<()> {
        match self.options.ddex_version {
            Some(wanted) if wanted != message.version() => Err(ErnError::UnsupportedConversion {
                from: message.version().to_string(),
                to: wanted.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn check_required(&self, message: &StructuredMessage) -> ErnResult<()> {
        let header = &message.header;
        let mut missing = Vec::new();
        if header.message_id().is_none() {
            missing.push("MessageHeader/MessageId".to_string());
        }
        if header.sender().is_none() {
            missing.push("MessageHeader/MessageSender".to_string());
        }
        if header.created().is_none() {
            missing.push("MessageHeader/MessageCreatedDateTime".to_string());
        }
        for (i, resource) in message.resources.iter().enumerate() {
            if resource.reference().is_none() {
                missing.push(format!(
                    "ResourceList/{}[{}]/ResourceReference",
                    resource.element().local_name,
                    i + 1
                ));
            }
        }
        for (i, release) in message.releases.iter().enumerate() {
            if release.reference().is_none() {
                missing.push(format!("ReleaseList/Release[{}]/ReleaseReference", i + 1));
            }
        }
        if let Some(preset) = self.options.preset {
            missing.extend(preset.missing_fields(message));
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ErnError::BuildIncomplete { missing })
        }
    }

    fn build_once(&self, message: &StructuredMessage) -> ErnResult<BuildReport> {
        let mut warnings: Vec<BuildWarning> = message
            .warnings()
            .iter()
            .map(|warning| BuildWarning {
                code: warning_code(warning).to_string(),
                message: warning.to_string(),
                location: None,
            })
            .collect();

        let mut root = self.assemble(message)?;
        for moved in reinsert(&mut root, &message.extensions, self.options.anchor_policy)? {
            warnings.push(BuildWarning {
                code: "extension_reattached".to_string(),
                message: format!("{} attached to {}", moved.name, moved.attached_to),
                location: Some(moved.original_path),
            });
        }

        let active = active_namespace(&root);
        canonical_transform(&mut root, active.as_deref(), self.options.canonicalize);
        let comments: &[String] = if self.options.canonicalize {
            &[]
        } else {
            &message.comments
        };
        let xml = XmlSerializer::new(self.options.namespace_strategy).document(
            &root,
            active.as_deref(),
            comments,
        )?;
        Ok(BuildReport {
            sha256: hex::encode(sha256(&xml.bytes)),
            element_count: xml.element_count,
            xml: xml.bytes,
            warnings,
        })
    }

    /// Lay the root's children out in section order
    fn assemble(&self, message: &StructuredMessage) -> ErnResult<Element> {
        let root = message.root();
        let mut assembler = MessageAssembler::new(root.to_element());
        for item in message.effective_layout() {
            let element = match &item {
                TopLevel::Header => self.header_element(message),
                TopLevel::PartyList => list(root, "PartyList", message.parties.iter().map(|e| e.element())),
                TopLevel::ResourceList => list(
                    root,
                    "ResourceList",
                    message.resources.iter().map(|e| e.element()),
                ),
                TopLevel::ReleaseList => list(
                    root,
                    "ReleaseList",
                    message.releases.iter().map(|e| e.element()),
                ),
                TopLevel::DealList => list(root, "DealList", message.deals.iter().map(|e| e.element())),
                TopLevel::Other(element) => element.clone(),
            };
            match BuildState::for_item(&item) {
                Some(section) => assembler.append_in(section, element)?,
                None => assembler.append(element)?,
            }
        }
        assembler.finish()
    }

    fn header_element(&self, message: &StructuredMessage) -> Element {
        let mut header = message.header.clone();
        if let Some(preset) = self.options.preset {
            if header.control_type().is_none() {
                header.set_control_type(preset.default_control_type());
            }
        }
        header.into_element()
    }
}

fn list<'a>(root: &MessageRoot, name: &str, entries: impl Iterator<Item = &'a Element>) -> Element {
    let mut list = root.list_element(name);
    list.children = entries.cloned().map(Node::Element).collect();
    list
}

fn warning_code(warning: &ParseWarning) -> &'static str {
    match warning {
        ParseWarning::DanglingReference { .. } => "dangling_reference",
        ParseWarning::MissingReference { .. } => "missing_reference",
        ParseWarning::DuplicateReference { .. } => "duplicate_reference",
    }
}

/// Build `message` with `options`
pub fn build(message: &StructuredMessage, options: &BuildOptions) -> ErnResult<Vec<u8>> {
    Builder::new(options.clone()).build(message)
}
