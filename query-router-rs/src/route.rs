//! Routes and routing decisions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend able to answer a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    RuleBased,
    LlmSql,
    Fallback,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::RuleBased, Route::LlmSql, Route::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::RuleBased => "RULE_BASED",
            Route::LlmSql => "LLM_SQL",
            Route::Fallback => "FALLBACK",
        }
    }

    /// Routes whose failures can open a circuit breaker
    pub fn is_guarded(&self) -> bool {
        matches!(self, Route::LlmSql)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a query goes and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub route_type: Route,
    pub reason: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub expected_execution_time_seconds: f64,
}

impl RoutingDecision {
    pub fn new<S: Into<String>>(route_type: Route, reason: S, confidence: f64, expected_time: f64) -> Self {
        Self {
            route_type,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            expected_execution_time_seconds: expected_time.max(0.0),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.route_type == Route::Fallback
    }
}
