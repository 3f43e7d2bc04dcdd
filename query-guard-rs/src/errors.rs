//! Error handling for the pipeline facade

use config_rs::ConfigError;
use input_sanitizer::SanitizerError;
use sql_validator::SqlSecurityError;
use thiserror::Error;

pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sanitizer setup failed: {0}")]
    Sanitizer(#[from] SanitizerError),

    /// Generated SQL was blocked, or the validator could not be configured
    #[error("SQL security error: {0}")]
    Security(#[from] SqlSecurityError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl GuardError {
    /// True when generated SQL was refused and must not be executed
    pub fn is_blocked_sql(&self) -> bool {
        matches!(self, GuardError::Security(e) if e.is_violation())
    }
}
