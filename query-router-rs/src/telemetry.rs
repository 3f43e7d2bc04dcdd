//! Metric emission
//!
//! Thin wrappers over the `metrics` macros. They are no-ops until the host
//! process installs a recorder.

use crate::circuit_breaker::CircuitState;
use crate::route::Route;
use metrics::{counter, gauge};

pub const DECISIONS: &str = "query_router.decisions";
pub const OUTCOMES: &str = "query_router.outcomes";
pub const CIRCUIT_OPEN: &str = "query_router.circuit_open";

pub fn record_decision(route: Route) {
    counter!(DECISIONS, 1, "route" => route.as_str());
}

pub fn record_outcome(route: Route, success: bool) {
    let success = if success { "true" } else { "false" };
    counter!(OUTCOMES, 1, "route" => route.as_str(), "success" => success);
}

pub fn record_circuit_state(route: Route, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 0.5,
        CircuitState::Open => 1.0,
    };
    gauge!(CIRCUIT_OPEN, value, "route" => route.as_str());
}
