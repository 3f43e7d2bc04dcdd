//! The input sanitizer
//!
//! Screens free text before it is turned into SQL. Screening never fails:
//! every input gets a [`ValidationResult`] holding a cleaned copy of the text,
//! the threats that were found and a confidence score.

use crate::errors::SanitizerResult;
use crate::sanitizers::{normalize_input, sanitize_query_text};
use crate::scoring::{confidence_score, Vocabulary};
use crate::threat::{RiskLevel, ThreatTag};
use crate::validators::{heuristic_threats, PatternTable};
use config_rs::SanitizerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Outcome of screening one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub sanitized_input: String,
    pub risk_level: RiskLevel,
    pub threats_detected: BTreeSet<ThreatTag>,
    pub confidence_score: f64,
}

impl ValidationResult {
    fn empty_input() -> Self {
        Self {
            is_valid: false,
            sanitized_input: String::new(),
            risk_level: RiskLevel::High,
            threats_detected: BTreeSet::new(),
            confidence_score: 0.0,
        }
    }

    pub fn has_threats(&self) -> bool {
        !self.threats_detected.is_empty()
    }

    pub fn has_threat(&self, tag: ThreatTag) -> bool {
        self.threats_detected.contains(&tag)
    }

    /// Comma separated tag names, for messages
    pub fn threat_list(&self) -> String {
        self.threats_detected
            .iter()
            .map(ThreatTag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Screens and cleans natural-language queries
#[derive(Debug, Clone)]
pub struct InputSanitizer {
    patterns: PatternTable,
    vocabulary: Vocabulary,
    config: SanitizerConfig,
}

impl InputSanitizer {
    /// Sanitizer with the built-in tables and default limits
    pub fn new() -> Self {
        Self {
            patterns: PatternTable::builtin(),
            vocabulary: Vocabulary::builtin(),
            config: SanitizerConfig::default(),
        }
    }

    /// Sanitizer with limits and extra rules taken from configuration.
    ///
    /// Fails if an extra threat pattern does not compile or names an unknown
    /// tag.
    pub fn with_config(config: &SanitizerConfig) -> SanitizerResult<Self> {
        let mut patterns = PatternTable::builtin();
        for extra in &config.additional_threat_patterns {
            patterns = patterns.with_named_rule(&extra.pattern, &extra.tag)?;
        }

        let vocabulary = Vocabulary::builtin().with_domain_keywords(&config.additional_domain_keywords);

        debug!(
            patterns = patterns.len(),
            domain_keywords = vocabulary.domain_keyword_count(),
            "Input sanitizer configured"
        );

        Ok(Self {
            patterns,
            vocabulary,
            config: config.clone(),
        })
    }

    /// Replace the pattern table
    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    /// Replace the scoring vocabulary
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Screen one input
    pub fn validate_and_sanitize(&self, raw: &str) -> ValidationResult {
        let normalized = normalize_input(raw).sanitized;
        if normalized.is_empty() {
            debug!("Rejected empty input");
            return ValidationResult::empty_input();
        }

        let lowered = normalized.to_lowercase();
        let mut threats = self.patterns.detect(&lowered);
        threats.extend(heuristic_threats(
            &normalized,
            self.config.max_input_length,
            self.config.max_quotes,
        ));

        let risk_level = RiskLevel::from_threats(&threats);
        let sanitized_input = sanitize_query_text(&normalized, self.config.truncate_length).sanitized;
        let confidence = confidence_score(&self.vocabulary, &sanitized_input, &threats, risk_level);

        let is_valid = risk_level != RiskLevel::High
            && confidence >= self.config.min_confidence
            && !sanitized_input.is_empty();

        if !threats.is_empty() {
            warn!(
                threats = ?threats,
                risk = %risk_level,
                confidence,
                input_chars = normalized.chars().count(),
                is_valid,
                "Threats detected in user input"
            );
        }

        ValidationResult {
            is_valid,
            sanitized_input,
            risk_level,
            threats_detected: threats,
            confidence_score: confidence,
        }
    }

    /// Whether the input may be handed to SQL generation, with the reason
    pub fn is_safe_for_generation(&self, raw: &str) -> (bool, String) {
        self.generation_verdict(&self.validate_and_sanitize(raw))
    }

    /// Generation gate applied to an already screened input
    pub fn generation_verdict(&self, result: &ValidationResult) -> (bool, String) {
        if result.sanitized_input.is_empty() {
            return (false, "Input is empty after sanitization".to_string());
        }
        if result.risk_level == RiskLevel::High {
            return (
                false,
                format!("High risk input rejected (threats: {})", result.threat_list()),
            );
        }
        if !result.is_valid {
            return (
                false,
                format!(
                    "Input failed validation (risk: {}, confidence: {:.1})",
                    result.risk_level, result.confidence_score
                ),
            );
        }
        if result.confidence_score < self.config.generation_min_confidence {
            return (
                false,
                format!(
                    "Confidence too low for query generation ({:.1} < {:.1})",
                    result.confidence_score, self.config.generation_min_confidence
                ),
            );
        }

        (true, "Input is safe for query generation".to_string())
    }

    /// Cleaned text if the input is valid and not high risk
    pub fn get_safe_input(&self, raw: &str) -> Option<String> {
        let result = self.validate_and_sanitize(raw);
        if result.is_valid && result.risk_level != RiskLevel::High {
            Some(result.sanitized_input)
        } else {
            None
        }
    }
}

impl Default for InputSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
