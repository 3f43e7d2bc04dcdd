//! Heuristic checks independent of the pattern table

use crate::threat::ThreatTag;
use std::collections::BTreeSet;

/// Punctuation accepted in a natural-language query
pub const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', ',', '!', '?', '(', ')'];

/// Letters (accented included), digits, whitespace and the allowed punctuation
pub fn is_allowed_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
}

/// First character outside the whitelist, if any
pub fn first_disallowed_char(input: &str) -> Option<char> {
    input.chars().find(|c| !is_allowed_char(*c))
}

/// Count single and double quotes not preceded by a backslash
pub fn count_unescaped_quotes(input: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;

    for c in input.chars() {
        match c {
            '\\' => {
                escaped = !escaped;
                continue;
            }
            '\'' | '"' if !escaped => count += 1,
            _ => {}
        }
        escaped = false;
    }

    count
}

/// Run the heuristic checks on normalized input
pub fn heuristic_threats(input: &str, max_length: usize, max_quotes: usize) -> BTreeSet<ThreatTag> {
    let mut found = BTreeSet::new();

    if first_disallowed_char(input).is_some() {
        found.insert(ThreatTag::InvalidCharacters);
    }
    if input.chars().count() > max_length {
        found.insert(ThreatTag::ExcessiveLength);
    }
    if count_unescaped_quotes(input) > max_quotes {
        found.insert(ThreatTag::ExcessiveQuotes);
    }

    found
}
