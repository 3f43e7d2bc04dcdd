//! String normalization
//!
//! Unicode, control-character and whitespace clean-up applied before any
//! pattern is matched.

use super::{chain_sanitizers, SanitizeResult};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref CONTROL_CHARS_REGEX: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Remove control characters from a string
pub fn remove_control_chars(input: &str) -> SanitizeResult<String> {
    let sanitized = CONTROL_CHARS_REGEX.replace_all(input, "").to_string();
    SanitizeResult::compare(input, sanitized, "Removed control characters")
}

/// Normalize Unicode text to its canonical composed form (NFC)
pub fn normalize_unicode(input: &str) -> SanitizeResult<String> {
    let normalized = input.nfc().collect::<String>();
    SanitizeResult::compare(input, normalized, "Normalized Unicode characters")
}

/// Trim whitespace from beginning and end
pub fn trim_whitespace(input: &str) -> SanitizeResult<String> {
    SanitizeResult::compare(input, input.trim().to_string(), "Trimmed whitespace")
}

/// Collapse whitespace runs into a single space and trim the ends
pub fn collapse_whitespace(input: &str) -> SanitizeResult<String> {
    let result = WHITESPACE_REGEX.replace_all(input, " ").trim().to_string();
    SanitizeResult::compare(input, result, "Collapsed whitespace")
}

/// Cut text to at most `max_chars` characters, the ellipsis included
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> SanitizeResult<String> {
    if input.chars().count() <= max_chars {
        return SanitizeResult::unmodified(input.to_string());
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = input.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);

    SanitizeResult::modified(
        truncated,
        Some(format!("Truncated to {} characters", max_chars)),
    )
}

/// Canonical form of raw input: control characters removed, NFC, trimmed
pub fn normalize_input(input: &str) -> SanitizeResult<String> {
    chain_sanitizers(
        input.to_string(),
        &[remove_control_chars, normalize_unicode, trim_whitespace],
    )
}
