//! Confidence scoring
//!
//! A query earns confidence by looking like a question about the maintenance
//! domain and loses it for every threat found.

use crate::threat::{RiskLevel, ThreatTag};
use std::collections::{BTreeSet, HashSet};

/// Domain vocabulary, matched as substrings of the lower-cased text
pub const DEFAULT_DOMAIN_KEYWORDS: &[&str] = &[
    "equipamento", "transformador", "disjuntor", "seccionadora", "subestação", "subestacao",
    "gerador", "motor", "bomba", "manutenção", "manutencao", "preventiva", "corretiva",
    "preditiva", "falha", "defeito", "custo", "ordem", "serviço", "servico", "inspeção",
    "inspecao", "status", "tensão", "tensao", "potência", "potencia", "fabricante", "modelo",
    "localização", "localizacao", "instalação", "instalacao", "criticidade", "prioridade",
    "peça", "peca", "estoque", "histórico", "historico", "data", "ano", "mês", "mes",
];

/// Interrogatives and imperatives, matched as whole tokens
pub const ACTION_VERBS: &[&str] = &[
    "quantos", "quantas", "qual", "quais", "quando", "onde", "como", "quem", "liste", "listar",
    "lista", "mostre", "mostrar", "exiba", "exibir", "busque", "buscar", "encontre",
    "encontrar", "informe", "existe", "existem", "compare", "comparar", "analise", "analisar",
];

const PER_THREAT_PENALTY: f64 = 15.0;
const SHORT_INPUT_CHARS: usize = 5;
const SHORT_INPUT_PENALTY: f64 = 30.0;
const LONG_INPUT_CHARS: usize = 150;
const LONG_INPUT_PENALTY: f64 = 10.0;
const PER_KEYWORD_BONUS: f64 = 5.0;
const MAX_KEYWORD_BONUS: f64 = 20.0;
const ACTION_VERB_BONUS: f64 = 10.0;

/// Keyword sets used for scoring; extendable from configuration
#[derive(Debug, Clone)]
pub struct Vocabulary {
    domain_keywords: Vec<String>,
    action_verbs: HashSet<String>,
}

impl Vocabulary {
    pub fn builtin() -> Self {
        Self {
            domain_keywords: DEFAULT_DOMAIN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            action_verbs: ACTION_VERBS.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Add domain keywords; blanks and duplicates are skipped
    pub fn with_domain_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !self.domain_keywords.contains(&keyword) {
                self.domain_keywords.push(keyword);
            }
        }
        self
    }

    /// Number of domain keywords present in `lowered`
    pub fn count_domain_keywords(&self, lowered: &str) -> usize {
        self.domain_keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .count()
    }

    /// Whether any token of `lowered` is an interrogative or imperative verb
    pub fn has_action_verb(&self, lowered: &str) -> bool {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| self.action_verbs.contains(token))
    }

    pub fn domain_keyword_count(&self) -> usize {
        self.domain_keywords.len()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Compute the 0..=100 confidence of a query.
///
/// `sanitized` is the cleaned text whose length is judged; keywords and verbs
/// are looked up in the lower-cased form of it.
pub fn confidence_score(
    vocabulary: &Vocabulary,
    sanitized: &str,
    threats: &BTreeSet<ThreatTag>,
    risk: RiskLevel,
) -> f64 {
    let mut score = 100.0;

    score -= PER_THREAT_PENALTY * threats.len() as f64;
    score -= risk.confidence_penalty();

    let length = sanitized.chars().count();
    if length < SHORT_INPUT_CHARS {
        score -= SHORT_INPUT_PENALTY;
    } else if length > LONG_INPUT_CHARS {
        score -= LONG_INPUT_PENALTY;
    }

    let lowered = sanitized.to_lowercase();
    let keyword_bonus = PER_KEYWORD_BONUS * vocabulary.count_domain_keywords(&lowered) as f64;
    score += keyword_bonus.min(MAX_KEYWORD_BONUS);

    if vocabulary.has_action_verb(&lowered) {
        score += ACTION_VERB_BONUS;
    }

    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn score(text: &str, threats: &[ThreatTag]) -> f64 {
        let threats: BTreeSet<ThreatTag> = threats.iter().copied().collect();
        let risk = RiskLevel::from_threats(&threats);
        confidence_score(&Vocabulary::builtin(), text, &threats, risk)
    }

    #[test_case("Liste todos os transformadores" => true ; "list")]
    #[test_case("Quantos disjuntores estão em manutenção?" => true ; "question mark suffix")]
    #[test_case("listagem de ativos" => false ; "prefix of a verb is not the verb")]
    fn test_has_action_verb(text: &str) -> bool {
        Vocabulary::builtin().has_action_verb(&text.to_lowercase())
    }

    #[test]
    fn test_clean_domain_query_is_capped() {
        assert_eq!(score("Liste todos os transformadores", &[]), 100.0);
    }

    #[test]
    fn test_threats_cost_confidence() {
        // 100 - 15 - 50
        assert_eq!(score("relatório geral xyz", &[ThreatTag::DdlCommand]), 35.0);
        // 100 - 15 - 20
        assert_eq!(score("relatório geral xyz", &[ThreatTag::SqlComment]), 65.0);
    }

    #[test]
    fn test_length_penalties() {
        assert_eq!(score("abc", &[]), 70.0);
        let long = "z".repeat(151);
        assert_eq!(score(&long, &[]), 90.0);
    }

    #[test]
    fn test_keyword_bonus_is_capped() {
        let vocab = Vocabulary::builtin();
        let text = "custo falha defeito ordem estoque bomba motor";
        assert!(vocab.count_domain_keywords(text) > 4);

        let threats: BTreeSet<ThreatTag> = [ThreatTag::DdlCommand].into_iter().collect();
        // 100 - 15 - 50 + 20
        assert_eq!(confidence_score(&vocab, text, &threats, RiskLevel::High), 55.0);
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let all: Vec<ThreatTag> = ThreatTag::ALL.to_vec();
        assert_eq!(score("x", &all), 0.0);
    }

    #[test]
    fn test_extra_keywords() {
        let vocab = Vocabulary::builtin().with_domain_keywords(["Religador", " ", "motor"]);
        assert_eq!(vocab.domain_keyword_count(), DEFAULT_DOMAIN_KEYWORDS.len() + 1);
        assert_eq!(vocab.count_domain_keywords("religador 12"), 1);
    }
}
