//! Utilities

pub mod duration;

pub use duration::{duration_seconds, IsoDuration};
