//! Keyword-based complexity classification

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Words marking analytical questions
pub const COMPLEX_KEYWORDS: &[&str] = &[
    "comparar", "compare", "comparação", "comparacao", "analisar", "análise", "analise",
    "correlação", "correlacao", "tendência", "tendencia", "evolução", "evolucao", "previsão",
    "previsao", "padrão", "padrao", "distribuição", "distribuicao", "versus",
];

/// Words marking aggregate or status questions
pub const MEDIUM_KEYWORDS: &[&str] = &[
    "status", "quantos", "quantas", "custo", "custos", "manutenção", "manutencao", "total",
    "média", "media", "soma", "último", "ultimo", "período", "periodo",
];

/// Words the rule-based engine answers directly
pub const RULE_KEYWORDS: &[&str] = &[
    "lista", "liste", "listar", "mostre", "mostrar", "exiba", "exibir", "todos", "todas",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryComplexity {
    Simple,
    Medium,
    Complex,
}

impl fmt::Display for QueryComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryComplexity::Simple => "simple",
            QueryComplexity::Medium => "medium",
            QueryComplexity::Complex => "complex",
        };
        f.write_str(name)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Keyword sets driving classification; complex wins over medium
#[derive(Debug, Clone)]
pub struct ComplexityRules {
    complex: HashSet<String>,
    medium: HashSet<String>,
    rule_keywords: HashSet<String>,
}

impl ComplexityRules {
    pub fn builtin() -> Self {
        let set = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<HashSet<_>>();
        Self {
            complex: set(COMPLEX_KEYWORDS),
            medium: set(MEDIUM_KEYWORDS),
            rule_keywords: set(RULE_KEYWORDS),
        }
    }

    /// Extra rule-engine keywords, typically from configuration
    pub fn with_rule_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() {
                self.rule_keywords.insert(keyword);
            }
        }
        self
    }

    pub fn classify(&self, text: &str) -> QueryComplexity {
        let mut complexity = QueryComplexity::Simple;
        for token in tokens(text) {
            if self.complex.contains(&token) {
                return QueryComplexity::Complex;
            }
            if self.medium.contains(&token) {
                complexity = QueryComplexity::Medium;
            }
        }
        complexity
    }

    pub fn has_rule_keyword(&self, text: &str) -> bool {
        tokens(text).any(|token| self.rule_keywords.contains(&token))
    }
}

impl Default for ComplexityRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_keyword_sets_are_disjoint() {
        for word in COMPLEX_KEYWORDS {
            assert!(!MEDIUM_KEYWORDS.contains(word), "{}", word);
            assert!(!RULE_KEYWORDS.contains(word), "{}", word);
        }
        for word in MEDIUM_KEYWORDS {
            assert!(!RULE_KEYWORDS.contains(word), "{}", word);
        }
    }

    #[test_case("Lista equipamentos" => QueryComplexity::Simple ; "list")]
    #[test_case("Quantos transformadores existem?" => QueryComplexity::Medium ; "count")]
    #[test_case("Qual o CUSTO total" => QueryComplexity::Medium ; "upper case")]
    #[test_case("Analisar tendência de falhas" => QueryComplexity::Complex ; "trend")]
    #[test_case("status versus custo" => QueryComplexity::Complex ; "complex wins")]
    #[test_case("" => QueryComplexity::Simple ; "empty")]
    fn test_classify(text: &str) -> QueryComplexity {
        ComplexityRules::builtin().classify(text)
    }

    #[test]
    fn test_rule_keywords() {
        let rules = ComplexityRules::builtin();
        assert!(rules.has_rule_keyword("Lista equipamentos"));
        assert!(rules.has_rule_keyword("mostre TODOS os motores"));
        assert!(!rules.has_rule_keyword("listagem de motores"));

        let rules = rules.with_rule_keywords(["Relacione"]);
        assert!(rules.has_rule_keyword("relacione os disjuntores"));
    }
}
