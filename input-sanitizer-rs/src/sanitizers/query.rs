//! Query-text defanging
//!
//! Every step only removes or shortens text, so repeating the pipeline until
//! nothing changes terminates quickly and yields a stable result.

use super::string::{collapse_whitespace, truncate_with_ellipsis};
use super::{chain_sanitizers, SanitizeResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BLOCK_COMMENT_REGEX: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref COMMENT_MARKER_REGEX: Regex = Regex::new(r"/\*|\*/").unwrap();
    static ref LINE_COMMENT_REGEX: Regex = Regex::new(r"(--|#)[^\n]*").unwrap();
    static ref STATEMENT_TAIL_REGEX: Regex = Regex::new(r"(?s);.*$").unwrap();
    static ref PERCENT_ENCODING_REGEX: Regex = Regex::new(r"(?i)%[0-9a-f]{2}").unwrap();
    static ref HEX_LITERAL_REGEX: Regex = Regex::new(r"(?i)\b0x[0-9a-f]+").unwrap();
    static ref ESCAPED_HEX_REGEX: Regex = Regex::new(r"(?i)\\x[0-9a-f]{2}").unwrap();
    static ref QUOTE_RUN_REGEX: Regex = Regex::new(r#"['"]{3,}"#).unwrap();
}

/// Remove block comments, stray comment markers and line comments
pub fn strip_comments(input: &str) -> SanitizeResult<String> {
    let without_blocks = BLOCK_COMMENT_REGEX.replace_all(input, " ");
    let without_markers = COMMENT_MARKER_REGEX.replace_all(&without_blocks, " ");
    let result = LINE_COMMENT_REGEX.replace_all(&without_markers, "").to_string();
    SanitizeResult::compare(input, result, "Removed comments")
}

/// Drop the first `;` and everything after it
pub fn drop_statement_tail(input: &str) -> SanitizeResult<String> {
    let result = STATEMENT_TAIL_REGEX.replace(input, "").to_string();
    SanitizeResult::compare(input, result, "Dropped statement separator and tail")
}

/// Remove percent-encoded bytes, hex literals and `\x` escapes
pub fn strip_encodings(input: &str) -> SanitizeResult<String> {
    let result = PERCENT_ENCODING_REGEX.replace_all(input, "");
    let result = HEX_LITERAL_REGEX.replace_all(&result, "");
    let result = ESCAPED_HEX_REGEX.replace_all(&result, "").to_string();
    SanitizeResult::compare(input, result, "Removed encoded sequences")
}

/// Collapse runs of three or more quotes down to their first two
pub fn collapse_quotes(input: &str) -> SanitizeResult<String> {
    let result = QUOTE_RUN_REGEX
        .replace_all(input, |caps: &regex::Captures| caps[0].chars().take(2).collect::<String>())
        .to_string();
    SanitizeResult::compare(input, result, "Collapsed quote runs")
}

/// One pass of the defanging pipeline
pub fn defang_pass(input: &str) -> SanitizeResult<String> {
    chain_sanitizers(
        input.to_string(),
        &[
            strip_comments,
            drop_statement_tail,
            strip_encodings,
            collapse_quotes,
            collapse_whitespace,
        ],
    )
}

/// Full query-text sanitization: defang until stable, then truncate.
///
/// The output is a fixed point: feeding it back returns it unchanged.
pub fn sanitize_query_text(input: &str, truncate_length: usize) -> SanitizeResult<String> {
    let mut current = input.to_string();
    let mut details = Vec::new();

    // Every modifying pass shortens the text, so this loop ends.
    loop {
        let pass = defang_pass(&current);
        if !pass.was_modified {
            break;
        }
        if let Some(detail) = pass.details {
            if !details.contains(&detail) {
                details.push(detail);
            }
        }
        current = pass.sanitized;
    }

    let truncated = truncate_with_ellipsis(&current, truncate_length);
    if let Some(detail) = truncated.details {
        details.push(detail);
    }
    current = truncated.sanitized;

    if current == input {
        SanitizeResult::unmodified(current)
    } else {
        let details = if details.is_empty() { None } else { Some(details.join("; ")) };
        SanitizeResult::modified(current, details)
    }
}
