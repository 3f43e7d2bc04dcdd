//! Hard security checks
//!
//! Both tables are evaluated before any structural analysis. A match is a
//! security violation, never an issue.

use crate::errors::{SqlResult, SqlSecurityError};
use lazy_static::lazy_static;
use regex::Regex;

/// Constructs typical of injection or exfiltration, with a description
pub const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    (r"--", "SQL line comment"),
    (r"#", "MySQL line comment"),
    (r"/\*|\*/", "SQL block comment"),
    (r";\s*\S", "multiple statements"),
    (r"@@\w*", "system variable access"),
    (r"(?i)\bunion\b(\s+all)?\s+select\b", "UNION injection"),
    (r"(?i)\b0x[0-9a-f]+", "hex encoded literal"),
    (r"(?i)\b(char|chr)\s*\(", "character encoding function"),
    (r"(?i)\b(sleep|pg_sleep|benchmark|load_file)\s*\(", "time delay or file access function"),
    (r"(?i)\bwaitfor\s+delay\b", "time delay"),
    (r"(?i)\b(information_schema|sqlite_master|sqlite_schema|pg_catalog)\b", "system catalog access"),
];

/// Statement kinds and procedures refused at every level
pub const BLOCKED_COMMANDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "CREATE", "ALTER", "TRUNCATE", "EXEC", "EXECUTE",
    "MERGE", "GRANT", "REVOKE", "BULK", "OPENROWSET", "OPENDATASOURCE", "ATTACH", "DETACH",
    "PRAGMA",
];

lazy_static! {
    static ref DANGEROUS_REGEXES: Vec<(Regex, &'static str)> = DANGEROUS_PATTERNS
        .iter()
        .map(|(pattern, description)| (Regex::new(pattern).unwrap(), *description))
        .collect();
    static ref BLOCKED_COMMAND_REGEX: Regex =
        Regex::new(&format!(r"(?i)\b({})\b", BLOCKED_COMMANDS.join("|"))).unwrap();
    static ref SYSTEM_PROCEDURE_REGEX: Regex = Regex::new(r"(?i)\b(sp|xp)_\w+").unwrap();
    static ref FILE_OUTPUT_REGEX: Regex = Regex::new(r"(?i)\binto\s+(outfile|dumpfile)\b").unwrap();
}

/// Raise on the first dangerous construct found.
///
/// The scan runs over the raw statement, string literals included, so a
/// literal such as `'--'` or `'a; b'` is reported as well.
pub fn check_dangerous_patterns(sql: &str) -> SqlResult<()> {
    for (regex, description) in DANGEROUS_REGEXES.iter() {
        if let Some(found) = regex.find(sql) {
            return Err(SqlSecurityError::dangerous_pattern(*description, found.as_str()));
        }
    }
    Ok(())
}

/// Raise on the first blocked command, system procedure or file output.
///
/// Keywords inside string literals count too: `status = 'update pending'`
/// is refused as an UPDATE. Rephrasing the filter is the only way around it.
pub fn check_blocked_commands(sql: &str) -> SqlResult<()> {
    if let Some(found) = BLOCKED_COMMAND_REGEX.find(sql) {
        return Err(SqlSecurityError::blocked_command(found.as_str().to_uppercase()));
    }
    if let Some(found) = SYSTEM_PROCEDURE_REGEX.find(sql) {
        return Err(SqlSecurityError::blocked_command(found.as_str().to_uppercase()));
    }
    if let Some(found) = FILE_OUTPUT_REGEX.find(sql) {
        return Err(SqlSecurityError::blocked_command(found.as_str().to_uppercase()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SELECT * FROM equipments -- x" ; "line comment")]
    #[test_case("SELECT * FROM equipments # x" ; "hash comment")]
    #[test_case("SELECT /* x */ * FROM equipments" ; "block comment")]
    #[test_case("SELECT 1; SELECT 2" ; "stacked")]
    #[test_case("SELECT @@version" ; "system variable")]
    #[test_case("SELECT name FROM equipments UNION ALL SELECT password FROM users" ; "union")]
    #[test_case("SELECT * FROM equipments WHERE name = 0x41" ; "hex")]
    #[test_case("SELECT CHAR(65)" ; "char")]
    #[test_case("SELECT SLEEP(5)" ; "sleep")]
    #[test_case("SELECT load_file('/etc/passwd')" ; "load file")]
    #[test_case("SELECT * FROM information_schema.tables" ; "catalog")]
    fn test_dangerous(sql: &str) {
        let err = check_dangerous_patterns(sql).unwrap_err();
        assert!(err.is_dangerous_pattern());
    }

    #[test_case("SELECT * FROM equipments" ; "plain")]
    #[test_case("SELECT * FROM equipments;" ; "trailing semicolon")]
    #[test_case("SELECT COUNT(*) FROM maintenance_orders WHERE status = 'open'" ; "count")]
    fn test_not_dangerous(sql: &str) {
        assert!(check_dangerous_patterns(sql).is_ok());
    }

    #[test]
    fn test_separator_inside_literal_is_reported() {
        let err = check_dangerous_patterns("SELECT * FROM equipments WHERE notes = 'a; b'").unwrap_err();
        assert!(err.is_dangerous_pattern());
    }

    #[test_case("DROP TABLE equipments" => "DROP" ; "drop")]
    #[test_case("delete from equipments" => "DELETE" ; "lower case delete")]
    #[test_case("SELECT * FROM equipments WHERE 1 = 1 AND EXEC('x')" => "EXEC" ; "exec")]
    #[test_case("SELECT sp_who" => "SP_WHO" ; "system procedure")]
    #[test_case("SELECT * INTO OUTFILE '/tmp/x' FROM equipments" => "INTO OUTFILE" ; "outfile")]
    #[test_case("PRAGMA table_info(equipments)" => "PRAGMA" ; "pragma")]
    #[test_case("SELECT * FROM equipments WHERE status = 'update pending'" => "UPDATE" ; "keyword inside literal")]
    fn test_blocked(sql: &str) -> String {
        match check_blocked_commands(sql) {
            Err(SqlSecurityError::BlockedCommand { command }) => command,
            other => panic!("expected blocked command, got {:?}", other),
        }
    }

    #[test_case("SELECT last_update, updated_at FROM equipments" ; "column names containing keywords")]
    #[test_case("SELECT * FROM spare_parts" ; "table starting with sp")]
    #[test_case("SELECT created_by FROM data_upload_history" ; "created column")]
    fn test_not_blocked(sql: &str) {
        assert!(check_blocked_commands(sql).is_ok());
    }
}
