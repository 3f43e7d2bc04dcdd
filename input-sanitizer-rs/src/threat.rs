//! Threat tags and risk levels

use crate::errors::SanitizerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Category of a danger pattern found in user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatTag {
    DdlCommand,
    DmlCommand,
    ExecCommand,
    StackedQuery,
    UnionInjection,
    ErrorBased,
    BooleanInjection,
    SqlComment,
    BlockComment,
    TimeBased,
    InfoDisclosure,
    BypassAttempt,
    InvalidCharacters,
    ExcessiveLength,
    ExcessiveQuotes,
}

impl ThreatTag {
    pub const ALL: [ThreatTag; 15] = [
        ThreatTag::DdlCommand,
        ThreatTag::DmlCommand,
        ThreatTag::ExecCommand,
        ThreatTag::StackedQuery,
        ThreatTag::UnionInjection,
        ThreatTag::ErrorBased,
        ThreatTag::BooleanInjection,
        ThreatTag::SqlComment,
        ThreatTag::BlockComment,
        ThreatTag::TimeBased,
        ThreatTag::InfoDisclosure,
        ThreatTag::BypassAttempt,
        ThreatTag::InvalidCharacters,
        ThreatTag::ExcessiveLength,
        ThreatTag::ExcessiveQuotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatTag::DdlCommand => "DDL_COMMAND",
            ThreatTag::DmlCommand => "DML_COMMAND",
            ThreatTag::ExecCommand => "EXEC_COMMAND",
            ThreatTag::StackedQuery => "STACKED_QUERY",
            ThreatTag::UnionInjection => "UNION_INJECTION",
            ThreatTag::ErrorBased => "ERROR_BASED",
            ThreatTag::BooleanInjection => "BOOLEAN_INJECTION",
            ThreatTag::SqlComment => "SQL_COMMENT",
            ThreatTag::BlockComment => "BLOCK_COMMENT",
            ThreatTag::TimeBased => "TIME_BASED",
            ThreatTag::InfoDisclosure => "INFO_DISCLOSURE",
            ThreatTag::BypassAttempt => "BYPASS_ATTEMPT",
            ThreatTag::InvalidCharacters => "INVALID_CHARACTERS",
            ThreatTag::ExcessiveLength => "EXCESSIVE_LENGTH",
            ThreatTag::ExcessiveQuotes => "EXCESSIVE_QUOTES",
        }
    }

    /// Tags that make an input HIGH risk on their own
    pub fn is_high_severity(&self) -> bool {
        matches!(
            self,
            ThreatTag::DdlCommand
                | ThreatTag::DmlCommand
                | ThreatTag::ExecCommand
                | ThreatTag::StackedQuery
                | ThreatTag::UnionInjection
                | ThreatTag::ErrorBased
        )
    }

    /// Tags that make an input at least MEDIUM risk
    pub fn is_medium_severity(&self) -> bool {
        matches!(
            self,
            ThreatTag::BooleanInjection
                | ThreatTag::SqlComment
                | ThreatTag::BlockComment
                | ThreatTag::TimeBased
                | ThreatTag::InfoDisclosure
                | ThreatTag::BypassAttempt
        )
    }
}

impl fmt::Display for ThreatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreatTag {
    type Err = SanitizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ThreatTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| SanitizerError::UnknownThreatTag(s.to_string()))
    }
}

/// Coarse severity of a piece of untrusted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Derive the risk level from a set of detected tags
    pub fn from_threats(threats: &BTreeSet<ThreatTag>) -> Self {
        if threats.iter().any(ThreatTag::is_high_severity) {
            RiskLevel::High
        } else if threats.iter().any(ThreatTag::is_medium_severity) {
            RiskLevel::Medium
        } else if threats.len() <= 2 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }

    /// Confidence points lost for this level
    pub fn confidence_penalty(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.0,
            RiskLevel::Medium => 20.0,
            RiskLevel::High => 50.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
