//! Error types for the vecurve core crate.

use std::fmt;

/// Errors raised by core arithmetic and conversions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// A value does not fit the signed 128-bit line representation.
    OutOfRange {
        /// What was being converted.
        what: &'static str,
    },
    /// Checked arithmetic overflowed.
    Overflow,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::OutOfRange { what } => write!(f, "{} does not fit in 128 bits", what),
            CoreError::Overflow => write!(f, "arithmetic overflow"),
        }
    }
}

impl std::error::Error for CoreError {}
