//! Error handling for the sanitizer
//!
//! Screening a query never fails: threats are reported inside the
//! [`ValidationResult`](crate::ValidationResult). These errors only come out
//! of building a sanitizer from a custom rule table.

use thiserror::Error;

/// Result type for sanitizer construction
pub type SanitizerResult<T> = Result<T, SanitizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizerError {
    /// A threat rule does not compile as a regular expression
    #[error("Invalid threat pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A threat rule names a tag that does not exist
    #[error("Unknown threat tag: {0}")]
    UnknownThreatTag(String),
}

impl SanitizerError {
    pub fn invalid_pattern<S: Into<String>>(pattern: S, err: &regex::Error) -> Self {
        SanitizerError::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}
