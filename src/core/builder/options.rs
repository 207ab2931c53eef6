//! Build options

use super::preset::Preset;
use crate::core::extension::AnchorPolicy;
use crate::core::namespace::NamespaceStrategy;
use crate::core::version::SchemaVersion;
use serde::{Deserialize, Serialize};

/// How strictly a message is checked before it is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreflightLevel {
    /// Any build warning fails the build
    Strict,
    /// Required fields are checked; warnings are reported
    #[default]
    Warn,
    /// No required-field checks
    None,
}

/// Options for building a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Expected schema version; a message of another version is rejected
    pub ddex_version: Option<SchemaVersion>,
    /// Extra required-field rules and defaults
    pub preset: Option<Preset>,
    /// Write canonical output (deal order normalized, comments dropped)
    pub canonicalize: bool,
    /// Build this many times and compare digests
    pub verify_determinism: Option<usize>,
    /// Prefix choice for extension namespaces
    pub namespace_strategy: NamespaceStrategy,
    /// What to do with extensions whose anchor is gone
    pub anchor_policy: AnchorPolicy,
    /// Checks run before and after building
    pub preflight: PreflightLevel,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            ddex_version: None,
            preset: None,
            canonicalize: true,
            verify_determinism: None,
            namespace_strategy: NamespaceStrategy::Locked,
            anchor_policy: AnchorPolicy::Reattach,
            preflight: PreflightLevel::Warn,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.ddex_version = Some(version);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_canonicalize(mut self, canonicalize: bool) -> Self {
        self.canonicalize = canonicalize;
        self
    }

    /// Verify determinism over `iterations` builds (values below 2 disable it)
    pub fn with_determinism_check(mut self, iterations: usize) -> Self {
        self.verify_determinism = Some(iterations);
        self
    }

    pub fn with_namespace_strategy(mut self, strategy: NamespaceStrategy) -> Self {
        self.namespace_strategy = strategy;
        self
    }

    pub fn with_anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.anchor_policy = policy;
        self
    }

    pub fn with_preflight(mut self, level: PreflightLevel) -> Self {
        self.preflight = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_json() {
        let options: BuildOptions =
            serde_json::from_str(r#"{"preset":"AudioSingle","verify_determinism":3}"#).unwrap();
        assert!(options.canonicalize);
        assert_eq!(options.preset, Some(Preset::AudioSingle));
        assert_eq!(options.verify_determinism, Some(3));
        assert_eq!(options.anchor_policy, AnchorPolicy::Reattach);
        assert_eq!(options.preflight, PreflightLevel::Warn);

        let strict: BuildOptions = serde_json::from_str(r#"{"preflight":"Strict"}"#).unwrap();
        assert_eq!(strict.preflight, PreflightLevel::Strict);
    }

    #[test]
    fn test_setters() {
        let options = BuildOptions::new()
            .with_version(SchemaVersion::Ern382)
            .with_canonicalize(false)
            .with_anchor_policy(AnchorPolicy::Fail)
            .with_preflight(PreflightLevel::None);
        assert_eq!(options.ddex_version, Some(SchemaVersion::Ern382));
        assert!(!options.canonicalize);
        assert_eq!(options.anchor_policy, AnchorPolicy::Fail);
        assert_eq!(options.preflight, PreflightLevel::None);
    }
}
