//! Danger-pattern table
//!
//! Ordered (pattern, tag) rules evaluated over lower-cased input. The table is
//! data: operators extend it through configuration rather than code.

use super::ThreatPattern;
use crate::threat::ThreatTag;
use lazy_static::lazy_static;
use regex::Regex;

/// Built-in rules, in evaluation order
pub const DEFAULT_THREAT_PATTERNS: &[(&str, ThreatTag)] = &[
    // Schema changes, including quote-escape forms such as `'; drop ...`
    (r"\b(drop|alter|truncate)\s+(table|database|schema|index|view|column|user)\b", ThreatTag::DdlCommand),
    (r"\bcreate\s+(table|database|schema|index|view|user|trigger|procedure)\b", ThreatTag::DdlCommand),
    (r#"['"]\s*;?\s*(drop|create|alter|truncate)\b"#, ThreatTag::DdlCommand),
    // Data changes
    (r"\binsert\s+into\b", ThreatTag::DmlCommand),
    (r"\bdelete\s+from\b", ThreatTag::DmlCommand),
    (r"\bupdate\s+\w+\s+set\b", ThreatTag::DmlCommand),
    (r"\b(replace|merge)\s+into\b", ThreatTag::DmlCommand),
    (r#"['"]\s*;?\s*(insert|delete|update|merge)\b"#, ThreatTag::DmlCommand),
    // Procedure execution
    (r"\bexec(ute)?(\s+|\s*\()", ThreatTag::ExecCommand),
    (r"\b(xp|sp)_\w+", ThreatTag::ExecCommand),
    // UNION based
    (r"\bunion\b(\s+all)?\s+select\b", ThreatTag::UnionInjection),
    (r#"['"]\s*\)?\s*union\b"#, ThreatTag::UnionInjection),
    // Boolean based
    (r#"['"]\s*(or|and)\b\s*['"]?\w+['"]?\s*=\s*['"]?\w+"#, ThreatTag::BooleanInjection),
    (r"\b(or|and)\s+\d+\s*=\s*\d+", ThreatTag::BooleanInjection),
    (r#"['"]\s*(or|and)\s+(true|false)\b"#, ThreatTag::BooleanInjection),
    // Comments
    (r"--", ThreatTag::SqlComment),
    (r"#", ThreatTag::SqlComment),
    (r"/\*|\*/", ThreatTag::BlockComment),
    // Stacked statements
    (r";\s*\w+", ThreatTag::StackedQuery),
    // Catalog and system references
    (r"\binformation_schema\b", ThreatTag::InfoDisclosure),
    (r"\b(sqlite_master|sqlite_schema|pg_catalog|pg_shadow|mysql\.user|sys\.\w+)", ThreatTag::InfoDisclosure),
    (r"@@\w+", ThreatTag::InfoDisclosure),
    (r"\b(version|database|current_user|user|schema)\s*\(\s*\)", ThreatTag::InfoDisclosure),
    // Time based
    (r"\b(sleep|pg_sleep|benchmark)\s*\(", ThreatTag::TimeBased),
    (r"\bwaitfor\s+delay\b", ThreatTag::TimeBased),
    // Error based
    (r"\b(extractvalue|updatexml)\s*\(", ThreatTag::ErrorBased),
    (r"\bfloor\s*\(\s*rand\s*\(", ThreatTag::ErrorBased),
    (r"\bexp\s*\(\s*~", ThreatTag::ErrorBased),
    // Encoding bypass
    (r"%[0-9a-f]{2}", ThreatTag::BypassAttempt),
    (r"\b0x[0-9a-f]+", ThreatTag::BypassAttempt),
    (r"\\x[0-9a-f]{2}", ThreatTag::BypassAttempt),
    (r"\b(char|chr|unhex|nchar)\s*\(", ThreatTag::BypassAttempt),
];

lazy_static! {
    static ref DEFAULT_TABLE: Vec<ThreatPattern> = DEFAULT_THREAT_PATTERNS
        .iter()
        .map(|(pattern, tag)| ThreatPattern {
            regex: Regex::new(pattern).unwrap(),
            tag: *tag,
        })
        .collect();
}

/// Compiled copy of the built-in rules
pub fn default_patterns() -> Vec<ThreatPattern> {
    DEFAULT_TABLE.clone()
}
