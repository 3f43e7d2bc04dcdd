//! Input sanitization utilities
//!
//! Cleaning is applied to every input regardless of whether it was judged
//! valid, so callers always have a defanged version of the text to display
//! or log.

pub mod query;
pub mod string;

pub use query::*;
pub use string::*;

/// Output of one cleaning pass or of a chain of passes
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeResult<T> {
    pub sanitized: T,
    pub was_modified: bool,
    /// `; `-joined descriptions of the passes that changed something
    pub details: Option<String>,
}

impl<T> SanitizeResult<T> {
    pub fn unmodified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: false,
            details: None,
        }
    }

    pub fn modified(content: T, details: Option<String>) -> Self {
        Self {
            sanitized: content,
            was_modified: true,
            details,
        }
    }
}

impl SanitizeResult<String> {
    /// Build a result by comparing the output with the input it came from
    pub fn compare(input: &str, output: String, detail: &str) -> Self {
        if output == input {
            SanitizeResult::unmodified(output)
        } else {
            SanitizeResult::modified(output, Some(detail.to_string()))
        }
    }
}

/// Feed `input` through each pass in order
pub fn chain_sanitizers(input: String, passes: &[fn(&str) -> SanitizeResult<String>]) -> SanitizeResult<String> {
    let mut text = input;
    let mut changed = false;
    let mut notes: Vec<String> = Vec::new();

    for pass in passes {
        let step = pass(&text);
        changed |= step.was_modified;
        notes.extend(step.details.filter(|_| step.was_modified));
        text = step.sanitized;
    }

    SanitizeResult {
        sanitized: text,
        was_modified: changed,
        details: (!notes.is_empty()).then(|| notes.join("; ")),
    }
}
