//! Error handling for SQL validation
//!
//! Only hard security violations are errors. Quality problems (unknown
//! tables, excessive joins) are reported as issues inside the analysis.

use thiserror::Error;

/// Result type for SQL validation
pub type SqlResult<T> = Result<T, SqlSecurityError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlSecurityError {
    /// A statement kind that is never allowed, whatever the level
    #[error("Blocked SQL command: {command}")]
    BlockedCommand { command: String },

    /// A construct typical of injection or exfiltration
    #[error("Dangerous SQL pattern detected: {description} ('{fragment}')")]
    DangerousPattern { description: String, fragment: String },

    /// The validator was configured with values it cannot use
    #[error("Invalid validator configuration: {0}")]
    InvalidConfiguration(String),
}

impl SqlSecurityError {
    pub fn blocked_command<S: Into<String>>(command: S) -> Self {
        SqlSecurityError::BlockedCommand {
            command: command.into(),
        }
    }

    pub fn dangerous_pattern<D: Into<String>, F: Into<String>>(description: D, fragment: F) -> Self {
        SqlSecurityError::DangerousPattern {
            description: description.into(),
            fragment: fragment.into(),
        }
    }

    pub fn is_blocked_command(&self) -> bool {
        matches!(self, SqlSecurityError::BlockedCommand { .. })
    }

    pub fn is_dangerous_pattern(&self) -> bool {
        matches!(self, SqlSecurityError::DangerousPattern { .. })
    }

    /// Whether the error came from inspecting a query rather than from setup
    pub fn is_violation(&self) -> bool {
        self.is_blocked_command() || self.is_dangerous_pattern()
    }
}
