//! Query similarity
//!
//! The router only asks whether two query texts are "similar"; how that is
//! decided lives behind [`SimilarityMatcher`].

use std::collections::HashSet;

/// Decides whether a past query is relevant to a new one
pub trait SimilarityMatcher: Send + Sync {
    fn is_similar(&self, query: &str, past_query: &str) -> bool;
}

/// Similar when the two texts share at least one word, case-insensitively
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl TokenOverlap {
    fn words(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

impl SimilarityMatcher for TokenOverlap {
    fn is_similar(&self, query: &str, past_query: &str) -> bool {
        let words = Self::words(query);
        if words.is_empty() {
            return false;
        }
        Self::words(past_query).iter().any(|w| words.contains(w))
    }
}

impl<F> SimilarityMatcher for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_similar(&self, query: &str, past_query: &str) -> bool {
        self(query, past_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Analisar tendência de falhas", "tendência de custos" => true ; "shared words")]
    #[test_case("Lista motores", "LISTA bombas" => true ; "case insensitive")]
    #[test_case("Lista motores", "quantos disjuntores" => false ; "nothing shared")]
    #[test_case("", "anything" => false ; "empty query")]
    #[test_case("falhas?", "falhas!" => true ; "punctuation ignored")]
    fn test_token_overlap(a: &str, b: &str) -> bool {
        TokenOverlap.is_similar(a, b)
    }

    #[test]
    fn test_closure_matcher() {
        let exact = |a: &str, b: &str| a == b;
        assert!(exact.is_similar("x", "x"));
        assert!(!exact.is_similar("x", "y"));
    }
}
