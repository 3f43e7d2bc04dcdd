//! The pipeline facade
//!
//! raw text → sanitizer → router → (backend) → SQL validator → outcome.
//! Running the chosen backend is the caller's job; the guard screens what
//! goes in and what comes back and keeps the router's history current.

use crate::errors::GuardResult;
use config_rs::GuardConfig;
use input_sanitizer::{InputSanitizer, ValidationResult};
use query_router::{
    AvailabilityRouter, CircuitSnapshot, HealthProbe, HealthStatus, PerformanceInsights, QueryOutcome, Route,
    RoutingDecision, ServiceMetrics,
};
use serde::Serialize;
use sql_validator::{SecurityLevel, SqlAnalysis, SqlValidator, ValidationSummary};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to a user question at the front of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Screening {
    /// Not safe to generate a query from; ask the user to rephrase
    Rejected { validation: ValidationResult, reason: String },
    /// Cleaned and routed
    Routed { validation: ValidationResult, decision: RoutingDecision },
}

impl Screening {
    pub fn validation(&self) -> &ValidationResult {
        match self {
            Screening::Rejected { validation, .. } | Screening::Routed { validation, .. } => validation,
        }
    }

    pub fn decision(&self) -> Option<&RoutingDecision> {
        match self {
            Screening::Routed { decision, .. } => Some(decision),
            Screening::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Screening::Rejected { .. })
    }
}

/// Sanitizer, router and validator sharing one configuration
pub struct QueryGuard {
    sanitizer: InputSanitizer,
    router: AvailabilityRouter,
    validator: SqlValidator,
}

impl QueryGuard {
    /// Guard with built-in defaults
    pub fn new() -> Self {
        Self {
            sanitizer: InputSanitizer::new(),
            router: AvailabilityRouter::new(),
            validator: SqlValidator::new(),
        }
    }

    pub fn from_config(config: &GuardConfig) -> GuardResult<Self> {
        config.validate()?;

        let guard = Self {
            sanitizer: InputSanitizer::with_config(&config.sanitizer)?,
            router: AvailabilityRouter::with_config(&config.router),
            validator: SqlValidator::with_config(&config.sql_validator)?,
        };

        info!(
            security_level = %guard.validator.default_level(),
            failure_threshold = config.router.failure_threshold,
            recovery_timeout_secs = ?config.router.recovery_timeout_secs,
            "Query guard initialized"
        );
        Ok(guard)
    }

    /// Load configuration from the environment and build the guard
    pub fn from_env() -> GuardResult<Self> {
        let config = GuardConfig::load()?;
        Self::from_config(&config)
    }

    pub fn register_backend<S: Into<String>>(&mut self, name: S, probe: Arc<dyn HealthProbe>) {
        self.router.register_backend(name, probe);
    }

    /// Screen a user question and, if it is safe, route its cleaned text
    pub fn screen(&self, text: &str) -> Screening {
        let validation = self.sanitizer.validate_and_sanitize(text);
        let (safe, reason) = self.sanitizer.generation_verdict(&validation);

        if !safe {
            info!(
                risk = %validation.risk_level,
                confidence = validation.confidence_score,
                reason = %reason,
                "Input rejected"
            );
            return Screening::Rejected { validation, reason };
        }

        let decision = self.router.route(&validation.sanitized_input);
        debug!(route = %decision.route_type, "Input routed");
        Screening::Routed { validation, decision }
    }

    /// Validate generated SQL at the configured level.
    ///
    /// An error means the statement must not run.
    pub fn check_sql(&self, sql: &str) -> GuardResult<SqlAnalysis> {
        self.check_sql_at(sql, self.validator.default_level())
    }

    pub fn check_sql_at(&self, sql: &str, level: SecurityLevel) -> GuardResult<SqlAnalysis> {
        self.validator.validate(sql, level).map_err(|e| {
            warn!(level = %level, error = %e, "Generated SQL blocked");
            e.into()
        })
    }

    pub fn record_outcome(&self, outcome: QueryOutcome) {
        self.router.record_outcome(outcome);
    }

    pub fn sanitizer(&self) -> &InputSanitizer {
        &self.sanitizer
    }

    pub fn router(&self) -> &AvailabilityRouter {
        &self.router
    }

    pub fn validator(&self) -> &SqlValidator {
        &self.validator
    }

    pub fn health_status(&self) -> HealthStatus {
        self.router.get_health_status()
    }

    pub fn service_metrics(&self, route: Option<Route>) -> Vec<ServiceMetrics> {
        self.router.get_service_metrics(route)
    }

    pub fn insights(&self) -> PerformanceInsights {
        self.router.get_insights()
    }

    pub fn circuit_breakers(&self) -> Vec<CircuitSnapshot> {
        self.router.circuit_breakers()
    }

    pub fn validation_summary(&self) -> ValidationSummary {
        self.validator.summary()
    }
}

impl Default for QueryGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_sanitizer::RiskLevel;

    #[test]
    fn test_injection_is_rejected_before_routing() {
        let guard = QueryGuard::new();
        let screening = guard.screen("'; DROP TABLE equipments; --");

        assert!(screening.is_rejected());
        assert!(screening.decision().is_none());
        assert_eq!(screening.validation().risk_level, RiskLevel::High);
        assert_eq!(guard.router().outcome_count(), 0);
    }

    #[test]
    fn test_domain_question_is_routed() {
        let guard = QueryGuard::new();
        let screening = guard.screen("Liste todos os transformadores");

        let decision = screening.decision().unwrap();
        assert_eq!(decision.route_type, Route::RuleBased);
        assert!(screening.validation().is_valid);
    }

    #[test]
    fn test_blocked_sql_is_an_error() {
        let guard = QueryGuard::new();
        let err = guard.check_sql("DROP TABLE equipments").unwrap_err();

        assert!(err.is_blocked_sql());
        assert_eq!(guard.validation_summary().queries_blocked, 1);
    }

    #[test]
    fn test_screening_serializes_with_tag() {
        let screening = QueryGuard::new().screen("Liste todos os transformadores");
        let json = serde_json::to_value(&screening).unwrap();

        assert_eq!(json["outcome"], "ROUTED");
        assert_eq!(json["decision"]["route_type"], "RULE_BASED");
    }
}
