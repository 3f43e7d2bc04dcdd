//! # SQL Validator
//!
//! Last stage before a generated statement reaches the database. Statements
//! are checked as text against a security level:
//!
//! - dangerous constructs and blocked commands raise [`SqlSecurityError`]
//! - commands, functions and clause sizes beyond the level become issues
//! - unknown tables and suspicious column names become issues
//! - a sanitized copy is always produced
//!
//! Running counters of validated, blocked and sanitized statements are kept
//! per validator instance.

mod errors;
mod level;
pub mod patterns;
pub mod sanitize;
pub mod structure;
mod validator;

pub use errors::{SqlResult, SqlSecurityError};
pub use level::{SecurityLevel, SecurityProfile};
pub use validator::{complexity_score, SqlAnalysis, SqlValidator, ValidationStatus, ValidationSummary};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::errors::{SqlResult, SqlSecurityError};
    pub use crate::level::SecurityLevel;
    pub use crate::validator::{SqlAnalysis, SqlValidator, ValidationStatus};
}

/// Version of the validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
