//! ERN value types
//!
//! This module defines the value types shared by the structured model.

pub mod identifier;

pub use identifier::{is_valid_icpn, is_valid_isrc, Identifier, IdentifierKind};
