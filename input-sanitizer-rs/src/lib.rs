//! # Input Sanitizer
//!
//! First stage of the query pipeline. Free-text questions about the equipment
//! and maintenance dataset are screened here before anything tries to turn
//! them into SQL.
//!
//! ## Features
//!
//! - Ordered danger-pattern table (DDL/DML, UNION, boolean, comments, stacked
//!   statements, catalog access, time/error based, encoding bypass)
//! - Heuristic checks on characters, length and quoting
//! - Risk classification and a 0-100 confidence score
//! - Idempotent cleaning of every input, valid or not
//! - Pattern and keyword tables extendable from configuration

mod errors;
mod sanitizer;
pub mod sanitizers;
pub mod scoring;
pub mod threat;
pub mod validators;

pub use errors::{SanitizerError, SanitizerResult};
pub use sanitizer::{InputSanitizer, ValidationResult};
pub use scoring::Vocabulary;
pub use threat::{RiskLevel, ThreatTag};
pub use validators::PatternTable;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::errors::{SanitizerError, SanitizerResult};
    pub use crate::sanitizer::{InputSanitizer, ValidationResult};
    pub use crate::threat::{RiskLevel, ThreatTag};
}

/// Version of the sanitizer library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Screen one input with the default sanitizer
pub fn validate_and_sanitize(raw: &str) -> ValidationResult {
    InputSanitizer::new().validate_and_sanitize(raw)
}
