//! Per-route metrics derived from the outcome log

use crate::circuit_breaker::CircuitState;
use crate::outcome::OutcomeLog;
use crate::route::Route;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub route: Route,
    /// Success ratio over the breaker window, 0.0 while the breaker is open
    pub availability: f64,
    pub avg_response_time: f64,
    pub success_rate: f64,
    pub total_requests: usize,
    pub error_count: usize,
    pub last_error: Option<String>,
}

impl ServiceMetrics {
    /// Metrics for a route that has no recorded outcome
    pub fn optimistic(route: Route) -> Self {
        Self {
            route,
            availability: 1.0,
            avg_response_time: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            error_count: 0,
            last_error: None,
        }
    }

    pub fn compute(log: &OutcomeLog, route: Route, breaker: CircuitState, window: usize) -> Self {
        let mut total = 0usize;
        let mut successes = 0usize;
        let mut time_sum = 0.0;
        let mut last_error = None;
        let mut windowed = 0usize;
        let mut windowed_successes = 0usize;

        for outcome in log.recent_for_route(route) {
            total += 1;
            time_sum += outcome.execution_time_seconds;

            if outcome.success {
                successes += 1;
            } else if last_error.is_none() {
                last_error = Some(
                    outcome
                        .error_type
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                );
            }

            if windowed < window {
                windowed += 1;
                if outcome.success {
                    windowed_successes += 1;
                }
            }
        }

        if total == 0 {
            let mut metrics = Self::optimistic(route);
            if breaker == CircuitState::Open {
                metrics.availability = 0.0;
            }
            return metrics;
        }

        let availability = if breaker == CircuitState::Open {
            0.0
        } else {
            windowed_successes as f64 / windowed as f64
        };

        Self {
            route,
            availability,
            avg_response_time: time_sum / total as f64,
            success_rate: successes as f64 / total as f64,
            total_requests: total,
            error_count: total - successes,
            last_error,
        }
    }
}
