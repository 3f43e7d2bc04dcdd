// config-rs/src/sections.rs
// Configuration sections for each pipeline stage

use serde::{Deserialize, Serialize};

/// Input sanitizer settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Inputs longer than this (in characters) are tagged EXCESSIVE_LENGTH
    pub max_input_length: usize,
    /// More unescaped quotes than this are tagged EXCESSIVE_QUOTES
    pub max_quotes: usize,
    /// Sanitized text is cut to this many characters, ellipsis included
    pub truncate_length: usize,
    /// Minimum confidence for an input to be considered valid
    pub min_confidence: f64,
    /// Minimum confidence for an input to be handed to SQL generation
    pub generation_min_confidence: f64,
    /// Domain words added to the built-in vocabulary
    pub additional_domain_keywords: Vec<String>,
    /// Extra (pattern, tag) rules appended after the built-in threat table
    pub additional_threat_patterns: Vec<ThreatPatternConfig>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_input_length: 500,
            max_quotes: 2,
            truncate_length: 200,
            min_confidence: 70.0,
            generation_min_confidence: 60.0,
            additional_domain_keywords: Vec::new(),
            additional_threat_patterns: Vec::new(),
        }
    }
}

/// A user supplied threat rule. `tag` must name a known threat tag,
/// e.g. `"DDL_COMMAND"`; `pattern` is matched against lower-cased input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThreatPatternConfig {
    pub pattern: String,
    pub tag: String,
}

/// SQL validator settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlValidatorConfig {
    /// One of STRICT, MODERATE, PERMISSIVE
    pub default_security_level: String,
    /// Tables generated SQL is allowed to reference
    pub known_tables: Vec<String>,
    pub additional_known_tables: Vec<String>,
}

pub const DEFAULT_KNOWN_TABLES: &[&str] = &[
    "equipments",
    "maintenance_orders",
    "failure_history",
    "spare_parts",
    "data_upload_history",
    "user_feedback",
];

impl Default for SqlValidatorConfig {
    fn default() -> Self {
        Self {
            default_security_level: "MODERATE".to_string(),
            known_tables: DEFAULT_KNOWN_TABLES.iter().map(|t| t.to_string()).collect(),
            additional_known_tables: Vec::new(),
        }
    }
}

/// Availability router settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Queries longer than this (in characters) go straight to fallback
    pub max_query_length: usize,
    /// Failures within the breaker window needed to open the breaker
    pub failure_threshold: usize,
    /// Number of most recent outcomes of a route inspected by the breaker
    pub breaker_window: usize,
    /// Number of most recent similar outcomes used for the historical score
    pub history_window: usize,
    /// Outcomes kept in memory; older ones are trimmed
    pub max_history: usize,
    /// Historical score used when there is nothing to learn from
    pub default_historical_score: f64,
    /// Historical score an LLM route must exceed
    pub llm_confidence_threshold: f64,
    /// Seconds before an open breaker allows a probe; `None` keeps it open
    /// until it is reset explicitly
    pub recovery_timeout_secs: Option<u64>,
    pub expected_time_rule_based_secs: f64,
    pub expected_time_llm_sql_secs: f64,
    pub expected_time_fallback_secs: f64,
    /// Words added to the built-in rule-engine vocabulary
    pub additional_rule_keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_query_length: 500,
            failure_threshold: 5,
            breaker_window: 10,
            history_window: 10,
            max_history: 1000,
            default_historical_score: 0.8,
            llm_confidence_threshold: 0.7,
            recovery_timeout_secs: None,
            expected_time_rule_based_secs: 0.5,
            expected_time_llm_sql_secs: 3.0,
            expected_time_fallback_secs: 0.2,
            additional_rule_keywords: Vec::new(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub json_format: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}
