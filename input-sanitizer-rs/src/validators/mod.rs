//! Threat detectors
//!
//! `security` holds the danger-pattern table, `heuristics` the checks that do
//! not fit a single pattern (character whitelist, length, quote count).

pub mod heuristics;
pub mod security;

pub use heuristics::*;
pub use security::{default_patterns, DEFAULT_THREAT_PATTERNS};

use crate::errors::{SanitizerError, SanitizerResult};
use crate::threat::ThreatTag;
use regex::Regex;
use std::collections::BTreeSet;

/// One compiled rule of the danger-pattern table
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    pub regex: Regex,
    pub tag: ThreatTag,
}

/// Ordered set of threat rules, compiled once when the sanitizer is built
#[derive(Debug, Clone)]
pub struct PatternTable {
    patterns: Vec<ThreatPattern>,
}

impl PatternTable {
    /// Table holding only the built-in rules
    pub fn builtin() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }

    /// Table without any rule
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Append a rule. The pattern is matched against lower-cased input.
    pub fn with_rule(mut self, pattern: &str, tag: ThreatTag) -> SanitizerResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| SanitizerError::invalid_pattern(pattern, &e))?;
        self.patterns.push(ThreatPattern { regex, tag });
        Ok(self)
    }

    /// Append a rule whose tag is given by name, as found in configuration
    pub fn with_named_rule(self, pattern: &str, tag: &str) -> SanitizerResult<Self> {
        let tag = tag.parse::<ThreatTag>()?;
        self.with_rule(pattern, tag)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Run every rule over already lower-cased text. Each matching rule
    /// contributes its tag; duplicates collapse.
    pub fn detect(&self, lowered: &str) -> BTreeSet<ThreatTag> {
        let mut found = BTreeSet::new();
        for pattern in &self.patterns {
            if found.contains(&pattern.tag) {
                continue;
            }
            if pattern.regex.is_match(lowered) {
                found.insert(pattern.tag);
            }
        }
        found
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_rule_is_evaluated() {
        let table = PatternTable::empty()
            .with_named_rule(r"\bshutdown\b", "EXEC_COMMAND")
            .unwrap();

        assert_eq!(table.len(), 1);
        let tags = table.detect("please shutdown now");
        assert!(tags.contains(&ThreatTag::ExecCommand));
        assert!(table.detect("status").is_empty());
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        let result = PatternTable::empty().with_rule("(oops", ThreatTag::SqlComment);
        assert!(matches!(result, Err(SanitizerError::InvalidPattern { .. })));

        let result = PatternTable::empty().with_named_rule("ok", "NOT_A_TAG");
        assert!(matches!(result, Err(SanitizerError::UnknownThreatTag(_))));
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let tags = PatternTable::builtin().detect("-- first -- second # third");
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&ThreatTag::SqlComment));
    }
}
