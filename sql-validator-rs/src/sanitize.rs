//! Best-effort cleaning of a statement

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BLOCK_COMMENT_REGEX: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT_REGEX: Regex = Regex::new(r"(--|#)[^\n]*").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Cleaned statement and whether anything beyond trimming was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSql {
    pub sql: String,
    pub applied: bool,
}

/// Strip comments, drop everything from the first `;`, and fold a multi-line
/// statement onto one line when anything was removed.
pub fn sanitize_sql(original: &str) -> SanitizedSql {
    let without_blocks = BLOCK_COMMENT_REGEX.replace_all(original, " ");
    let without_comments = LINE_COMMENT_REGEX.replace_all(&without_blocks, "");

    let single_statement = match without_comments.find(';') {
        Some(index) => &without_comments[..index],
        None => &without_comments[..],
    };

    let applied = single_statement != original;
    let sql = if applied && original.contains('\n') {
        WHITESPACE_REGEX.replace_all(single_statement, " ").trim().to_string()
    } else {
        single_statement.trim().to_string()
    };

    SanitizedSql { sql, applied }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_statement_untouched() {
        let result = sanitize_sql("SELECT * FROM equipments");
        assert!(!result.applied);
        assert_eq!(result.sql, "SELECT * FROM equipments");
    }

    #[test]
    fn test_multiline_clean_statement_keeps_lines() {
        let result = sanitize_sql("SELECT *\nFROM equipments");
        assert!(!result.applied);
        assert_eq!(result.sql, "SELECT *\nFROM equipments");
    }

    #[test]
    fn test_trailing_semicolon_removed() {
        let result = sanitize_sql("SELECT * FROM equipments;");
        assert!(result.applied);
        assert_eq!(result.sql, "SELECT * FROM equipments");
    }

    #[test]
    fn test_hash_comment_removed() {
        let result = sanitize_sql("SELECT name FROM equipments # trailing note");
        assert!(result.applied);
        assert_eq!(result.sql, "SELECT name FROM equipments");
    }

    #[test]
    fn test_comments_and_tail_removed() {
        let result = sanitize_sql("SELECT name -- the name\nFROM equipments /* all */;\nDROP TABLE equipments");
        assert!(result.applied);
        assert_eq!(result.sql, "SELECT name FROM equipments");
    }
}
