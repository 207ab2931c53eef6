//! ISO 8601 duration utilities
//!
//! ERN writes durations as `xs:duration` values such as `PT3M45S`,
//! `PT0H3M45.500S` or `P0DT1H2M`. The model keeps the text as written; this
//! module parses it for projections and validation.

use std::fmt;
use thiserror::Error;

/// A parsed duration with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IsoDuration {
    millis: u64,
}

/// Error for a string that is not an ISO 8601 duration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ISO 8601 duration '{0}'")]
pub struct DurationParseError(pub String);

impl IsoDuration {
    /// Duration of `millis` milliseconds
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Total milliseconds
    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Total seconds, fractional part included
    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Parse `PnYnMnDTnHnMnS` (years and months are rejected, they have no fixed length)
    pub fn parse(s: &str) -> Result<Self, DurationParseError> {
        let err = || DurationParseError(s.to_string());
        let rest = s.trim().strip_prefix('P').ok_or_else(err)?;
        if rest.is_empty() {
            return Err(err());
        }

        let mut millis: u64 = 0;
        let mut in_time = false;
        let mut number = String::new();
        let mut seen_component = false;
        for c in rest.chars() {
            match c {
                '0'..='9' | '.' => number.push(c),
                'T' if !in_time && number.is_empty() => in_time = true,
                'D' | 'H' | 'M' | 'S' if !number.is_empty() => {
                    let unit_millis: f64 = match (c, in_time) {
                        ('D', false) => 86_400_000.0,
                        ('H', true) => 3_600_000.0,
                        ('M', true) => 60_000.0,
                        ('S', true) => 1000.0,
                        _ => return Err(err()),
                    };
                    // only seconds may carry a fraction
                    if c != 'S' && number.contains('.') {
                        return Err(err());
                    }
                    let value: f64 = number.parse().map_err(|_| err())?;
                    millis = millis
                        .checked_add((value * unit_millis).round() as u64)
                        .ok_or_else(err)?;
                    number.clear();
                    seen_component = true;
                }
                _ => return Err(err()),
            }
        }
        if !number.is_empty() || !seen_component {
            return Err(err());
        }
        Ok(Self { millis })
    }
}

impl fmt::Display for IsoDuration {
    /// Formats as `PT#H#M#S`, omitting zero components
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.millis / 1000;
        let fraction = self.millis % 1000;
        let (hours, minutes, seconds) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);
        write!(f, "PT")?;
        if hours > 0 {
            write!(f, "{}H", hours)?;
        }
        if minutes > 0 {
            write!(f, "{}M", minutes)?;
        }
        if seconds > 0 || fraction > 0 || (hours == 0 && minutes == 0) {
            if fraction > 0 {
                write!(f, "{}.{:03}S", seconds, fraction)?;
            } else {
                write!(f, "{}S", seconds)?;
            }
        }
        Ok(())
    }
}

/// Seconds in an ISO 8601 duration, or `None` when it does not parse
pub fn duration_seconds(s: &str) -> Option<f64> {
    IsoDuration::parse(s).ok().map(|d| d.as_secs_f64())
}
