//! The availability router
//!
//! Picks a route for each query from its complexity, the outcomes of similar
//! past queries and the state of the LLM_SQL circuit breaker. All mutable
//! state sits behind one lock: routing and reporting take it shared, while
//! recording an outcome appends and re-evaluates the breaker in a single
//! exclusive section.

use crate::circuit_breaker::{BreakerPolicy, CircuitBreaker, CircuitSnapshot, CircuitState};
use crate::complexity::{ComplexityRules, QueryComplexity};
use crate::health::{check_backends, Backend, HealthProbe, HealthStatus};
use crate::insights::PerformanceInsights;
use crate::outcome::{OutcomeLog, QueryOutcome};
use crate::route::{Route, RoutingDecision};
use crate::service_metrics::ServiceMetrics;
use crate::similarity::{SimilarityMatcher, TokenOverlap};
use crate::telemetry;
use config_rs::RouterConfig;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const EMPTY_QUERY_CONFIDENCE: f64 = 1.0;
const TOO_LONG_CONFIDENCE: f64 = 0.9;
const BREAKER_OPEN_CONFIDENCE: f64 = 0.8;
const RULE_BASED_CONFIDENCE: f64 = 0.9;
const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.6;

struct RouterState {
    log: OutcomeLog,
    breakers: BTreeMap<Route, CircuitBreaker>,
}

impl RouterState {
    fn new(max_history: usize) -> Self {
        Self {
            log: OutcomeLog::new(max_history),
            breakers: Route::ALL.iter().map(|r| (*r, CircuitBreaker::new(*r))).collect(),
        }
    }

    fn circuit_state(&self, route: Route, policy: &BreakerPolicy) -> CircuitState {
        self.breakers
            .get(&route)
            .map_or(CircuitState::Closed, |b| b.state(policy))
    }
}

/// Routes queries between the rule engine, the LLM and the fallback path
pub struct AvailabilityRouter {
    config: RouterConfig,
    policy: BreakerPolicy,
    rules: ComplexityRules,
    matcher: Box<dyn SimilarityMatcher>,
    backends: Vec<Backend>,
    state: RwLock<RouterState>,
}

impl AvailabilityRouter {
    /// Router with default thresholds and no registered backend
    pub fn new() -> Self {
        Self::with_config(&RouterConfig::default())
    }

    pub fn with_config(config: &RouterConfig) -> Self {
        let policy = BreakerPolicy {
            failure_threshold: config.failure_threshold,
            window: config.breaker_window,
            recovery_timeout: config.recovery_timeout_secs.map(Duration::from_secs),
        };

        Self {
            config: config.clone(),
            policy,
            rules: ComplexityRules::builtin().with_rule_keywords(&config.additional_rule_keywords),
            matcher: Box::new(TokenOverlap),
            backends: Vec::new(),
            state: RwLock::new(RouterState::new(config.max_history)),
        }
    }

    /// Replace how past queries are matched against new ones
    pub fn with_matcher<M: SimilarityMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Override the breaker recovery timeout; `None` disables recovery
    pub fn with_recovery_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.policy.recovery_timeout = timeout;
        self
    }

    /// Register a backend checked by [`get_health_status`](Self::get_health_status)
    pub fn register_backend<S: Into<String>>(&mut self, name: S, probe: Arc<dyn HealthProbe>) {
        let backend = Backend::new(name, probe);
        debug!(backend = %backend.name, "Registered backend");
        self.backends.push(backend);
    }

    pub fn with_backend<S: Into<String>>(mut self, name: S, probe: Arc<dyn HealthProbe>) -> Self {
        self.register_backend(name, probe);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn default_expected_time(&self, route: Route) -> f64 {
        match route {
            Route::RuleBased => self.config.expected_time_rule_based_secs,
            Route::LlmSql => self.config.expected_time_llm_sql_secs,
            Route::Fallback => self.config.expected_time_fallback_secs,
        }
    }

    fn decide(&self, state: &RouterState, route: Route, reason: String, confidence: f64) -> RoutingDecision {
        let expected = state
            .log
            .mean_execution_time(route)
            .unwrap_or_else(|| self.default_expected_time(route));
        RoutingDecision::new(route, reason, confidence, expected)
    }

    /// Choose a route for a query. Never fails.
    pub fn route(&self, text: &str) -> RoutingDecision {
        let query = text.trim();
        let state = self.state.read();

        let decision = if query.is_empty() {
            self.decide(&state, Route::Fallback, "Empty query".to_string(), EMPTY_QUERY_CONFIDENCE)
        } else if query.chars().count() > self.config.max_query_length {
            self.decide(
                &state,
                Route::Fallback,
                format!("Query too long ({} characters)", query.chars().count()),
                TOO_LONG_CONFIDENCE,
            )
        } else if !state.circuit_state(Route::LlmSql, &self.policy).allows_requests() {
            self.decide(
                &state,
                Route::Fallback,
                "LLM_SQL circuit breaker active".to_string(),
                BREAKER_OPEN_CONFIDENCE,
            )
        } else {
            let complexity = self.rules.classify(query);
            let score = state.log.historical_score(
                query,
                self.matcher.as_ref(),
                self.config.history_window,
                self.config.default_historical_score,
            );

            match complexity {
                QueryComplexity::Simple if self.rules.has_rule_keyword(query) => self.decide(
                    &state,
                    Route::RuleBased,
                    "Simple query matching rule-based patterns".to_string(),
                    RULE_BASED_CONFIDENCE,
                ),
                QueryComplexity::Medium | QueryComplexity::Complex
                    if score > self.config.llm_confidence_threshold =>
                {
                    self.decide(
                        &state,
                        Route::LlmSql,
                        format!("{} query with historical score {:.2}", complexity, score),
                        score,
                    )
                }
                _ => self.decide(
                    &state,
                    Route::Fallback,
                    format!("No confident route for {} query (historical score {:.2})", complexity, score),
                    DEFAULT_FALLBACK_CONFIDENCE,
                ),
            }
        };

        debug!(
            route = %decision.route_type,
            confidence = decision.confidence,
            query_chars = query.chars().count(),
            reason = %decision.reason,
            "Routing decision"
        );
        telemetry::record_decision(decision.route_type);
        decision
    }

    /// Append an outcome and re-evaluate the breaker of its route
    pub fn record_outcome(&self, outcome: QueryOutcome) {
        let route = outcome.route();
        let success = outcome.success;
        let error_type = outcome.error_type.clone();

        let transition = {
            let mut state = self.state.write();
            let RouterState { log, breakers } = &mut *state;
            log.push(outcome);

            if route.is_guarded() {
                breakers
                    .get_mut(&route)
                    .and_then(|breaker| breaker.on_outcome(log, success, &self.policy))
            } else {
                None
            }
        };

        telemetry::record_outcome(route, success);

        match transition {
            Some(CircuitState::Open) => {
                warn!(
                    route = %route,
                    threshold = self.policy.failure_threshold,
                    window = self.policy.window,
                    error_type = ?error_type,
                    "Circuit breaker opened"
                );
                telemetry::record_circuit_state(route, CircuitState::Open);
            }
            Some(state) => {
                info!(route = %route, state = ?state, "Circuit breaker state changed");
                telemetry::record_circuit_state(route, state);
            }
            None => {}
        }
    }

    /// Close a route's breaker; failures recorded before the reset no longer count
    pub fn reset_circuit_breaker(&self, route: Route) {
        let mut state = self.state.write();
        let next_seq = state.log.next_seq();
        if let Some(breaker) = state.breakers.get_mut(&route) {
            breaker.reset(next_seq);
        }
        drop(state);

        info!(route = %route, "Circuit breaker reset");
        telemetry::record_circuit_state(route, CircuitState::Closed);
    }

    pub fn circuit_state(&self, route: Route) -> CircuitState {
        self.state.read().circuit_state(route, &self.policy)
    }

    pub fn is_circuit_open(&self, route: Route) -> bool {
        self.circuit_state(route) == CircuitState::Open
    }

    pub fn circuit_breakers(&self) -> Vec<CircuitSnapshot> {
        let state = self.state.read();
        state.breakers.values().map(|b| b.snapshot(&self.policy)).collect()
    }

    /// Probe every registered backend
    pub fn get_health_status(&self) -> HealthStatus {
        let health = check_backends(&self.backends);
        if !health.issues.is_empty() {
            warn!(status = %health.status, issues = ?health.issues, "Backends unavailable");
        }
        health
    }

    /// Metrics for one route, or for every route when `None`
    pub fn get_service_metrics(&self, route: Option<Route>) -> Vec<ServiceMetrics> {
        let state = self.state.read();
        let routes: Vec<Route> = match route {
            Some(route) => vec![route],
            None => Route::ALL.to_vec(),
        };

        routes
            .into_iter()
            .map(|route| {
                let breaker = state.circuit_state(route, &self.policy);
                ServiceMetrics::compute(&state.log, route, breaker, self.config.breaker_window)
            })
            .collect()
    }

    pub fn get_insights(&self) -> PerformanceInsights {
        let state = self.state.read();
        let active = state.circuit_state(Route::LlmSql, &self.policy) != CircuitState::Closed;
        PerformanceInsights::compute(&state.log, active)
    }

    pub fn outcome_count(&self) -> usize {
        self.state.read().log.len()
    }

    /// Up to `limit` latest outcomes, oldest first
    pub fn recent_outcomes(&self, limit: usize) -> Vec<QueryOutcome> {
        self.state.read().log.recent(limit)
    }

    /// Historical score the router would use for `text` right now
    pub fn historical_score(&self, text: &str) -> f64 {
        self.state.read().log.historical_score(
            text.trim(),
            self.matcher.as_ref(),
            self.config.history_window,
            self.config.default_historical_score,
        )
    }
}

impl Default for AvailabilityRouter {
    fn default() -> Self {
        Self::new()
    }
}
