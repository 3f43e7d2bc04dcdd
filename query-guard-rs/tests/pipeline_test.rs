use query_guard::prelude::*;
use config_rs::ThreatPatternConfig;
use query_guard::{GuardConfig, ThreatTag};
use std::io::Write;
use std::sync::Arc;
use test_case::test_case;

fn llm_outcome(text: &str, success: bool) -> QueryOutcome {
    let decision = RoutingDecision::new(Route::LlmSql, "generated", 0.8, 3.0);
    let outcome = QueryOutcome::new(text, decision, success, 3.0);
    if success {
        outcome
    } else {
        outcome.with_error("sql_generation_failed")
    }
}

#[test]
fn test_injection_attempt_is_rejected() {
    let guard = QueryGuard::new();
    let screening = guard.screen("'; DROP TABLE equipments; --");

    let validation = screening.validation();
    assert!(screening.is_rejected());
    assert!(!validation.is_valid);
    assert_eq!(validation.risk_level, RiskLevel::High);
    assert!(validation.has_threat(ThreatTag::DdlCommand));
}

#[test]
fn test_domain_question_passes() {
    let guard = QueryGuard::new();
    let screening = guard.screen("Liste todos os transformadores");

    let validation = screening.validation();
    assert!(validation.is_valid);
    assert_eq!(validation.risk_level, RiskLevel::Low);
    assert!(validation.confidence_score >= 70.0);
    assert_eq!(screening.decision().map(|d| d.route_type), Some(Route::RuleBased));
}

#[test]
fn test_plain_select_is_valid_at_strict() {
    let guard = QueryGuard::new();
    let analysis = guard
        .check_sql_at("SELECT * FROM equipments", SecurityLevel::Strict)
        .unwrap();

    assert_eq!(analysis.validation_result, ValidationStatus::Valid);
    assert!(analysis.issues_found.is_empty());
}

#[test_case(SecurityLevel::Strict ; "strict")]
#[test_case(SecurityLevel::Moderate ; "moderate")]
#[test_case(SecurityLevel::Permissive ; "permissive")]
fn test_drop_is_blocked_at_every_level(level: SecurityLevel) {
    let guard = QueryGuard::new();
    let err = guard.check_sql_at("DROP TABLE equipments", level).unwrap_err();

    assert!(err.is_blocked_sql());
    assert_eq!(guard.validation_summary().queries_blocked, 1);
}

#[test]
fn test_listing_routes_to_rule_engine() {
    let decision = QueryGuard::new().router().route("Lista equipamentos");
    assert_eq!(decision.route_type, Route::RuleBased);
    assert!(decision.confidence > 0.8);
}

#[test]
fn test_trend_question_follows_history() {
    let guard = QueryGuard::new();
    guard.record_outcome(llm_outcome("Analisar falhas por equipamento", true).with_confidence(0.75));
    assert!((guard.router().historical_score("Analisar tendência de falhas") - 0.75).abs() < 1e-9);

    let decision = guard.router().route("Analisar tendência de falhas");
    assert_eq!(decision.route_type, Route::LlmSql);
    assert!((decision.confidence - 0.75).abs() < 1e-9);
}

#[test]
fn test_history_blends_success_and_failure() {
    let guard = QueryGuard::new();
    guard.record_outcome(llm_outcome("custos de manutenção", true).with_confidence(0.9));
    guard.record_outcome(llm_outcome("custos por equipamento", false).with_confidence(0.4));

    let score = guard.router().historical_score("custos totais");
    assert!(score > 0.2 && score < 0.9, "score {}", score);
}

#[test]
fn test_full_llm_round_trip() {
    let guard = QueryGuard::new();
    let screening = guard.screen("Qual o custo total de manutenção por equipamento?");
    let decision = screening.decision().cloned().unwrap();
    assert_eq!(decision.route_type, Route::LlmSql);

    let analysis = guard
        .check_sql("SELECT equipment_id, SUM(cost) FROM maintenance_orders GROUP BY equipment_id")
        .unwrap();
    assert!(analysis.is_valid());

    let sanitized = &screening.validation().sanitized_input;
    guard.record_outcome(QueryOutcome::new(sanitized.as_str(), decision, true, 2.4));

    let metrics = guard.service_metrics(Some(Route::LlmSql));
    assert_eq!(metrics[0].total_requests, 1);
    assert_eq!(metrics[0].success_rate, 1.0);
    assert_eq!(guard.insights().total_queries, 1);
}

#[test]
fn test_repeated_llm_failures_force_fallback() {
    let guard = QueryGuard::new();
    for _ in 0..5 {
        guard.record_outcome(llm_outcome("consulta gerada", false));
    }

    let screening = guard.screen("Qual o custo total de manutenção por equipamento?");
    let decision = screening.decision().unwrap();
    assert_eq!(decision.route_type, Route::Fallback);
    assert!(decision.reason.to_lowercase().contains("circuit breaker"));

    let insights = guard.insights();
    assert!(insights.circuit_breaker_active);
    assert!(insights.has_recommendation("success rate low"));
}

#[test]
fn test_health_reports_unavailable_backends() {
    let mut guard = QueryGuard::new();
    guard.register_backend("rule_engine", Arc::new(|| true));
    guard.register_backend("llm", Arc::new(|| false));

    let health = guard.health_status();
    assert_eq!(health.total_services, 2);
    assert_eq!(health.issues, vec!["llm service unavailable"]);
}

#[test]
fn test_guard_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[sql_validator]
default_security_level = "STRICT"
additional_known_tables = ["substations"]

[router]
failure_threshold = 2
breaker_window = 4
additional_rule_keywords = ["relacione"]

[sanitizer]
additional_domain_keywords = ["subestação"]
"#
    )
    .unwrap();

    let config = GuardConfig::load_from_path(file.path()).unwrap();
    let guard = QueryGuard::from_config(&config).unwrap();

    assert_eq!(guard.validator().default_level(), SecurityLevel::Strict);
    assert!(guard.validator().known_tables().any(|t| t == "substations"));
    assert_eq!(guard.router().route("relacione as subestações").route_type, Route::RuleBased);

    // EXPLAIN is outside the STRICT command set
    let analysis = guard.check_sql("EXPLAIN SELECT * FROM substations").unwrap();
    assert!(!analysis.is_valid());

    guard.record_outcome(llm_outcome("consulta gerada", false));
    guard.record_outcome(llm_outcome("consulta gerada", false));
    assert_eq!(guard.router().circuit_state(Route::LlmSql), CircuitState::Open);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = GuardConfig::default();
    config.router.failure_threshold = 0;
    assert!(matches!(QueryGuard::from_config(&config), Err(GuardError::Config(_))));

    let mut config = GuardConfig::default();
    config.sanitizer.additional_threat_patterns = vec![config_threat("(unclosed", "DDL_COMMAND")];
    assert!(matches!(QueryGuard::from_config(&config), Err(GuardError::Sanitizer(_))));

    let mut config = GuardConfig::default();
    config.sql_validator.additional_known_tables = vec!["bad table".to_string()];
    assert!(matches!(QueryGuard::from_config(&config), Err(GuardError::Security(_))));
}

fn config_threat(pattern: &str, tag: &str) -> ThreatPatternConfig {
    ThreatPatternConfig {
        pattern: pattern.to_string(),
        tag: tag.to_string(),
    }
}
