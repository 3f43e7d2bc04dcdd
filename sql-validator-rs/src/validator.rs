//! The SQL validator
//!
//! Checks a generated statement in three stages: hard security violations
//! (raised as errors), quality issues against the security level (reported
//! in the analysis) and a best-effort sanitized copy of the statement.

use crate::errors::{SqlResult, SqlSecurityError};
use crate::level::SecurityLevel;
use crate::patterns::{check_blocked_commands, check_dangerous_patterns};
use crate::sanitize::sanitize_sql;
use crate::structure::{normalize_whitespace, QueryStructure};
use config_rs::SqlValidatorConfig;
use lazy_static::lazy_static;
use metrics::counter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

lazy_static! {
    static ref TABLE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z_]\w*$").unwrap();
}

/// Verdict on a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// No issues
    Valid,
    /// Issues remain and sanitizing did not change the statement
    Invalid,
    /// Issues remain but a sanitized statement is available
    Sanitized,
    /// Hard security violation, only produced by [`SqlValidator::analyze`]
    Blocked,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::Invalid => "INVALID",
            ValidationStatus::Sanitized => "SANITIZED",
            ValidationStatus::Blocked => "BLOCKED",
        }
    }
}

/// Full report on one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAnalysis {
    pub original_query: String,
    pub sanitized_query: String,
    pub validation_result: ValidationStatus,
    pub security_level: SecurityLevel,
    pub issues_found: Vec<String>,
    pub suggestions: Vec<String>,
    pub complexity_score: u32,
    pub tables_accessed: Vec<String>,
    pub columns_accessed: Vec<String>,
    pub functions_used: Vec<String>,
}

impl SqlAnalysis {
    pub fn is_valid(&self) -> bool {
        self.validation_result == ValidationStatus::Valid
    }

    fn blocked(original: &str, level: SecurityLevel, error: &SqlSecurityError) -> Self {
        Self {
            original_query: original.to_string(),
            sanitized_query: String::new(),
            validation_result: ValidationStatus::Blocked,
            security_level: level,
            issues_found: vec![error.to_string()],
            suggestions: vec!["Generate a read-only SELECT statement without comments or encodings".to_string()],
            complexity_score: 0,
            tables_accessed: Vec::new(),
            columns_accessed: Vec::new(),
            functions_used: Vec::new(),
        }
    }
}

/// Snapshot of the validator's running counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub queries_validated: u64,
    pub queries_blocked: u64,
    pub queries_sanitized: u64,
    pub block_rate: f64,
}

/// Weighted sum used to rank statements by structural complexity
pub fn complexity_score(structure: &QueryStructure, functions_used: usize) -> u32 {
    let score = 2 * structure.tables.len()
        + 3 * structure.joins
        + 5 * structure.subqueries
        + structure.where_conditions
        + 2 * functions_used
        + structure.order_by
        + 2 * structure.group_by;
    u32::try_from(score).unwrap_or(u32::MAX)
}

/// Issues and suggestions collected for one statement
#[derive(Default)]
struct Findings {
    issues: Vec<String>,
    suggestions: Vec<String>,
}

impl Findings {
    fn add(&mut self, issue: String, suggestion: &str) {
        self.issues.push(issue);
        if !self.suggestions.iter().any(|s| s == suggestion) {
            self.suggestions.push(suggestion.to_string());
        }
    }
}

/// Validates generated SQL against a security level
#[derive(Debug)]
pub struct SqlValidator {
    default_level: SecurityLevel,
    known_tables: BTreeSet<String>,
    validated: AtomicU64,
    blocked: AtomicU64,
    sanitized: AtomicU64,
}

impl SqlValidator {
    /// Validator for the default equipment schema at MODERATE level
    pub fn new() -> Self {
        let config = SqlValidatorConfig::default();
        Self::with_parts(SecurityLevel::default(), config.known_tables.iter())
    }

    /// Validator using the configured level and table list
    pub fn with_config(config: &SqlValidatorConfig) -> SqlResult<Self> {
        let level: SecurityLevel = config.default_security_level.parse()?;

        let names = config.known_tables.iter().chain(config.additional_known_tables.iter());
        for name in names.clone() {
            if !TABLE_NAME_REGEX.is_match(name) {
                return Err(SqlSecurityError::InvalidConfiguration(format!(
                    "Invalid table name: {}",
                    name
                )));
            }
        }

        let validator = Self::with_parts(level, names);
        debug!(
            level = %level,
            known_tables = validator.known_tables.len(),
            "SQL validator configured"
        );
        Ok(validator)
    }

    fn with_parts<'a, I>(default_level: SecurityLevel, tables: I) -> Self
    where
        I: Iterator<Item = &'a String>,
    {
        Self {
            default_level,
            known_tables: tables.map(|t| t.to_lowercase()).collect(),
            validated: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            sanitized: AtomicU64::new(0),
        }
    }

    pub fn default_level(&self) -> SecurityLevel {
        self.default_level
    }

    pub fn known_tables(&self) -> impl Iterator<Item = &str> {
        self.known_tables.iter().map(String::as_str)
    }

    /// Validate at the configured default level
    pub fn validate_default(&self, sql: &str) -> SqlResult<SqlAnalysis> {
        self.validate(sql, self.default_level)
    }

    /// Validate a statement.
    ///
    /// Returns an error for dangerous patterns and blocked commands; any other
    /// problem is listed in the analysis.
    pub fn validate(&self, sql: &str, level: SecurityLevel) -> SqlResult<SqlAnalysis> {
        self.validated.fetch_add(1, Ordering::Relaxed);
        counter!("sql_validator.validated", 1, "level" => level.as_str());

        let normalized = normalize_whitespace(sql);

        if let Err(error) = check_dangerous_patterns(&normalized).and_then(|_| check_blocked_commands(&normalized)) {
            self.blocked.fetch_add(1, Ordering::Relaxed);
            counter!("sql_validator.blocked", 1, "level" => level.as_str());
            warn!(error = %error, level = %level, "Blocked SQL statement");
            return Err(error);
        }

        let mut findings = Findings::default();

        if normalized.is_empty() {
            findings.add("Empty query".to_string(), "Generate a non-empty SELECT statement");
            return Ok(self.finish(sql, level, findings, &QueryStructure::default(), Vec::new()));
        }

        let profile = level.profile();
        let structure = QueryStructure::extract(&normalized);

        match structure.command.as_deref() {
            Some(command) if profile.allows_command(command) => {}
            Some(command) => findings.add(
                format!("Command not allowed at {} level: {}", level, command),
                &format!("Use one of: {}", profile.allowed_commands.join(", ")),
            ),
            None => findings.add(
                "Could not determine the statement type".to_string(),
                "Start the statement with SELECT",
            ),
        }

        let ceilings = [
            ("JOINs", structure.joins, profile.max_joins, "Reduce the number of joined tables"),
            ("subqueries", structure.subqueries, profile.max_subqueries, "Replace subqueries with joins or simpler filters"),
            ("WHERE conditions", structure.where_conditions, profile.max_where_conditions, "Simplify the filter conditions"),
            ("ORDER BY columns", structure.order_by, profile.max_order_by, "Sort by fewer columns"),
            ("GROUP BY columns", structure.group_by, profile.max_group_by, "Group by fewer columns"),
        ];
        for (what, found, max, suggestion) in ceilings {
            if found > max {
                findings.add(format!("Too many {}: {} (max {})", what, found, max), suggestion);
            }
        }

        let mut functions_used = Vec::new();
        for function in &structure.functions {
            if profile.allows_function(function) {
                functions_used.push(function.clone());
            } else {
                findings.add(
                    format!("Function not allowed at {} level: {}", level, function),
                    "Remove or replace functions outside the allowed list",
                );
            }
        }

        for table in &structure.tables {
            if !self.known_tables.contains(table) {
                findings.add(
                    format!("Unknown table: {}", table),
                    &format!(
                        "Use one of the known tables: {}",
                        self.known_tables.iter().cloned().collect::<Vec<_>>().join(", ")
                    ),
                );
            }
        }

        for column in &structure.columns {
            if column != "*" && column.chars().count() < 2 {
                findings.add(
                    format!("Suspicious column name: {}", column),
                    "Use descriptive column names from the schema",
                );
            }
        }

        Ok(self.finish(sql, level, findings, &structure, functions_used))
    }

    fn finish(
        &self,
        original: &str,
        level: SecurityLevel,
        findings: Findings,
        structure: &QueryStructure,
        functions_used: Vec<String>,
    ) -> SqlAnalysis {
        let cleaned = sanitize_sql(original);

        let validation_result = if findings.issues.is_empty() {
            ValidationStatus::Valid
        } else if cleaned.applied {
            ValidationStatus::Sanitized
        } else {
            ValidationStatus::Invalid
        };

        if validation_result == ValidationStatus::Sanitized {
            self.sanitized.fetch_add(1, Ordering::Relaxed);
            counter!("sql_validator.sanitized", 1, "level" => level.as_str());
        }

        let complexity = complexity_score(structure, functions_used.len());

        if findings.issues.is_empty() {
            debug!(level = %level, complexity, "SQL statement valid");
        } else {
            info!(
                level = %level,
                result = validation_result.as_str(),
                issues = findings.issues.len(),
                complexity,
                "SQL statement has issues"
            );
        }

        SqlAnalysis {
            original_query: original.to_string(),
            sanitized_query: cleaned.sql,
            validation_result,
            security_level: level,
            issues_found: findings.issues,
            suggestions: findings.suggestions,
            complexity_score: complexity,
            tables_accessed: structure.tables.clone(),
            columns_accessed: structure.columns.clone(),
            functions_used,
        }
    }

    /// Like [`validate`](Self::validate) but reports violations as a
    /// `BLOCKED` analysis instead of an error
    pub fn analyze(&self, sql: &str, level: SecurityLevel) -> SqlAnalysis {
        match self.validate(sql, level) {
            Ok(analysis) => analysis,
            Err(error) => SqlAnalysis::blocked(sql, level, &error),
        }
    }

    /// True only for statements that validate without any issue
    pub fn is_safe_query(&self, sql: &str) -> bool {
        matches!(self.validate_default(sql), Ok(analysis) if analysis.is_valid())
    }

    /// Sanitized statement when it is valid or could be sanitized
    pub fn get_safe_sql(&self, sql: &str) -> Option<String> {
        match self.validate_default(sql) {
            Ok(analysis)
                if matches!(
                    analysis.validation_result,
                    ValidationStatus::Valid | ValidationStatus::Sanitized
                ) =>
            {
                Some(analysis.sanitized_query)
            }
            _ => None,
        }
    }

    /// Running counters since construction
    pub fn summary(&self) -> ValidationSummary {
        let queries_validated = self.validated.load(Ordering::Relaxed);
        let queries_blocked = self.blocked.load(Ordering::Relaxed);
        let queries_sanitized = self.sanitized.load(Ordering::Relaxed);

        let block_rate = if queries_validated == 0 {
            0.0
        } else {
            queries_blocked as f64 / queries_validated as f64
        };

        ValidationSummary {
            queries_validated,
            queries_blocked,
            queries_sanitized,
            block_rate,
        }
    }
}

impl Default for SqlValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_select_all_is_valid_at_strict() {
        let validator = SqlValidator::new();
        let analysis = validator.validate("SELECT * FROM equipments", SecurityLevel::Strict).unwrap();

        assert_eq!(analysis.validation_result, ValidationStatus::Valid);
        assert!(analysis.issues_found.is_empty());
        assert!(analysis.suggestions.is_empty());
        assert_eq!(analysis.tables_accessed, vec!["equipments"]);
        assert_eq!(analysis.columns_accessed, vec!["*"]);
        assert_eq!(analysis.complexity_score, 2);
    }

    #[test_case(SecurityLevel::Strict ; "strict")]
    #[test_case(SecurityLevel::Moderate ; "moderate")]
    #[test_case(SecurityLevel::Permissive ; "permissive")]
    fn test_drop_is_blocked_at_every_level(level: SecurityLevel) {
        let validator = SqlValidator::new();
        let err = validator.validate("DROP TABLE equipments", level).unwrap_err();

        assert!(err.is_blocked_command());
        assert_eq!(validator.summary().queries_blocked, 1);
        assert_eq!(validator.summary().queries_validated, 1);
    }

    #[test_case("DELETE FROM equipments" ; "delete")]
    #[test_case("UPDATE equipments SET status = 'x'" ; "update")]
    #[test_case("INSERT INTO equipments VALUES (1)" ; "insert")]
    #[test_case("SELECT * FROM equipments; DROP TABLE equipments" ; "stacked drop")]
    #[test_case("EXEC xp_cmdshell 'dir'" ; "exec")]
    #[test_case("GRANT ALL ON equipments TO public" ; "grant")]
    fn test_blocked_statements_never_validate(sql: &str) {
        let validator = SqlValidator::new();
        for level in SecurityLevel::ALL {
            assert!(validator.validate(sql, level).is_err(), "{} at {}", sql, level);
        }
    }

    #[test]
    fn test_with_needs_moderate() {
        let validator = SqlValidator::new();
        let sql = "WITH recent AS (SELECT * FROM maintenance_orders) SELECT * FROM recent";

        let strict = validator.validate(sql, SecurityLevel::Strict).unwrap();
        assert_eq!(strict.validation_result, ValidationStatus::Invalid);
        assert_eq!(strict.issues_found, vec!["Command not allowed at STRICT level: WITH"]);

        let moderate = validator.validate(sql, SecurityLevel::Moderate).unwrap();
        assert_eq!(moderate.validation_result, ValidationStatus::Valid);
        assert_eq!(moderate.tables_accessed, vec!["maintenance_orders"]);
    }

    #[test]
    fn test_function_whitelist() {
        let validator = SqlValidator::new();
        let sql = "SELECT UPPER(name), COUNT(*) FROM equipments GROUP BY name";

        let strict = validator.validate(sql, SecurityLevel::Strict).unwrap();
        assert_eq!(strict.issues_found, vec!["Function not allowed at STRICT level: UPPER"]);
        assert_eq!(strict.functions_used, vec!["COUNT"]);

        let moderate = validator.validate(sql, SecurityLevel::Moderate).unwrap();
        assert!(moderate.is_valid());
        assert_eq!(moderate.functions_used, vec!["UPPER", "COUNT"]);
    }

    #[test]
    fn test_join_ceiling() {
        let validator = SqlValidator::new();
        let sql = "SELECT e.name FROM equipments e \
                   JOIN maintenance_orders m ON m.equipment_id = e.id \
                   JOIN failure_history f ON f.equipment_id = e.id \
                   JOIN spare_parts s ON s.equipment_id = e.id";

        let strict = validator.validate(sql, SecurityLevel::Strict).unwrap();
        assert_eq!(strict.issues_found, vec!["Too many JOINs: 3 (max 2)"]);
        assert_eq!(strict.suggestions, vec!["Reduce the number of joined tables"]);

        assert!(validator.validate(sql, SecurityLevel::Moderate).unwrap().is_valid());
    }

    #[test]
    fn test_unknown_table_and_short_column() {
        let validator = SqlValidator::new();
        let analysis = validator
            .validate("SELECT a FROM secret_accounts", SecurityLevel::Moderate)
            .unwrap();

        assert_eq!(analysis.validation_result, ValidationStatus::Invalid);
        assert_eq!(
            analysis.issues_found,
            vec!["Unknown table: secret_accounts", "Suspicious column name: a"]
        );
        assert_eq!(analysis.suggestions.len(), 2);
    }

    #[test]
    fn test_issues_with_semicolon_are_sanitized() {
        let validator = SqlValidator::new();
        let analysis = validator
            .validate("SELECT *\nFROM secret_accounts;", SecurityLevel::Moderate)
            .unwrap();

        assert_eq!(analysis.validation_result, ValidationStatus::Sanitized);
        assert_eq!(analysis.sanitized_query, "SELECT * FROM secret_accounts");
        assert_eq!(validator.summary().queries_sanitized, 1);
    }

    #[test]
    fn test_trailing_semicolon_without_issues_is_valid() {
        let validator = SqlValidator::new();
        let analysis = validator.validate("SELECT * FROM equipments;", SecurityLevel::Strict).unwrap();

        assert!(analysis.is_valid());
        assert_eq!(analysis.sanitized_query, "SELECT * FROM equipments");
    }

    #[test]
    fn test_empty_query_is_invalid() {
        let validator = SqlValidator::new();
        let analysis = validator.validate("   ", SecurityLevel::Moderate).unwrap();

        assert_eq!(analysis.validation_result, ValidationStatus::Invalid);
        assert_eq!(analysis.issues_found, vec!["Empty query"]);
    }

    #[test]
    fn test_analyze_reports_blocked() {
        let validator = SqlValidator::new();
        let analysis = validator.analyze("SELECT * FROM equipments -- x", SecurityLevel::Permissive);

        assert_eq!(analysis.validation_result, ValidationStatus::Blocked);
        assert!(analysis.issues_found[0].contains("SQL line comment"));
        assert_eq!(validator.summary().queries_blocked, 1);
    }

    #[test]
    fn test_safe_helpers() {
        let validator = SqlValidator::new();

        assert!(validator.is_safe_query("SELECT status FROM equipments"));
        assert!(!validator.is_safe_query("SELECT status FROM nowhere"));
        assert!(!validator.is_safe_query("DROP TABLE equipments"));

        assert_eq!(
            validator.get_safe_sql("SELECT status FROM equipments;"),
            Some("SELECT status FROM equipments".to_string())
        );
        assert_eq!(validator.get_safe_sql("SELECT status FROM nowhere"), None);
        assert_eq!(validator.get_safe_sql("DELETE FROM equipments"), None);
    }

    #[test]
    fn test_summary() {
        let validator = SqlValidator::new();
        assert_eq!(validator.summary().block_rate, 0.0);

        let _ = validator.validate("SELECT * FROM equipments", SecurityLevel::Strict);
        let _ = validator.validate("DROP TABLE equipments", SecurityLevel::Strict);

        let summary = validator.summary();
        assert_eq!(summary.queries_validated, 2);
        assert_eq!(summary.queries_blocked, 1);
        assert_eq!(summary.block_rate, 0.5);
    }

    #[test]
    fn test_with_config() {
        let config = SqlValidatorConfig {
            default_security_level: "strict".to_string(),
            additional_known_tables: vec!["Substations".to_string()],
            ..SqlValidatorConfig::default()
        };
        let validator = SqlValidator::with_config(&config).unwrap();

        assert_eq!(validator.default_level(), SecurityLevel::Strict);
        assert!(validator.is_safe_query("SELECT name FROM substations"));

        let bad_level = SqlValidatorConfig {
            default_security_level: "LOOSE".to_string(),
            ..SqlValidatorConfig::default()
        };
        assert!(SqlValidator::with_config(&bad_level).is_err());

        let bad_table = SqlValidatorConfig {
            additional_known_tables: vec!["x; drop".to_string()],
            ..SqlValidatorConfig::default()
        };
        assert!(matches!(
            SqlValidator::with_config(&bad_table),
            Err(SqlSecurityError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_complexity_score() {
        let validator = SqlValidator::new();
        let analysis = validator
            .validate(
                "SELECT e.name, COUNT(m.id) FROM equipments e JOIN maintenance_orders m ON m.equipment_id = e.id \
                 WHERE m.status = 'open' GROUP BY e.name ORDER BY e.name",
                SecurityLevel::Moderate,
            )
            .unwrap();

        // 2*2 tables + 3*1 join + 1 where + 2*1 function + 1 order by + 2*1 group by
        assert_eq!(analysis.complexity_score, 13);
    }
}
