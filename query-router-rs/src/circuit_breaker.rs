//! Outcome-driven circuit breaker
//!
//! ```text
//! +--------+  threshold failures   +------+   recovery timeout   +-----------+
//! | Closed | --------------------> | Open | -------------------> | Half-Open |
//! +--------+   in recent window    +------+    (if configured)   +-----------+
//!     ^                                ^                               |
//!     |            success             |           failure             |
//!     +--------------------------------+-------------------------------+
//! ```
//!
//! Failures are counted over the most recent outcomes of the breaker's route
//! in the outcome log. Without a recovery timeout an open breaker stays open
//! until it is reset.

use crate::outcome::OutcomeLog;
use crate::route::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Route rejected
    Open,
    /// Recovery timeout elapsed; the next outcome decides
    HalfOpen,
}

impl CircuitState {
    pub fn allows_requests(&self) -> bool {
        !matches!(self, CircuitState::Open)
    }
}

/// Thresholds shared by every breaker of a router
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerPolicy {
    pub failure_threshold: usize,
    pub window: usize,
    pub recovery_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed,
    Open { since: Instant },
}

/// Point-in-time view of one breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub route: Route,
    pub state: CircuitState,
    pub trips: u64,
    pub opened_at: Option<DateTime<Utc>>,
}

/// Breaker for one route
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    route: Route,
    state: BreakerState,
    opened_at: Option<DateTime<Utc>>,
    /// Outcomes with a lower sequence number no longer count
    window_start: u64,
    trips: u64,
}

impl CircuitBreaker {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            state: BreakerState::Closed,
            opened_at: None,
            window_start: 0,
            trips: 0,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn trips(&self) -> u64 {
        self.trips
    }

    /// Current state, with the recovery timeout applied
    pub fn state(&self, policy: &BreakerPolicy) -> CircuitState {
        match self.state {
            BreakerState::Closed => CircuitState::Closed,
            BreakerState::Open { since } => match policy.recovery_timeout {
                Some(timeout) if since.elapsed() >= timeout => CircuitState::HalfOpen,
                _ => CircuitState::Open,
            },
        }
    }

    pub fn snapshot(&self, policy: &BreakerPolicy) -> CircuitSnapshot {
        CircuitSnapshot {
            route: self.route,
            state: self.state(policy),
            trips: self.trips,
            opened_at: self.opened_at,
        }
    }

    /// Failures among the latest `window` outcomes of this route that count
    pub fn recent_failures(&self, log: &OutcomeLog, window: usize) -> usize {
        log.newest_first()
            .filter(|e| e.seq >= self.window_start && e.outcome.route() == self.route)
            .take(window)
            .filter(|e| !e.outcome.success)
            .count()
    }

    /// React to a newly logged outcome of this route.
    ///
    /// Returns the new state when it changed.
    pub fn on_outcome(&mut self, log: &OutcomeLog, success: bool, policy: &BreakerPolicy) -> Option<CircuitState> {
        match (self.state(policy), success) {
            (CircuitState::Closed, false) => {
                if self.recent_failures(log, policy.window) >= policy.failure_threshold {
                    self.open();
                    return Some(CircuitState::Open);
                }
                None
            }
            (CircuitState::HalfOpen, true) => {
                self.close(log.next_seq());
                Some(CircuitState::Closed)
            }
            (CircuitState::HalfOpen, false) => {
                self.open();
                Some(CircuitState::Open)
            }
            _ => None,
        }
    }

    fn open(&mut self) {
        self.state = BreakerState::Open { since: Instant::now() };
        self.opened_at = Some(Utc::now());
        self.trips += 1;
    }

    fn close(&mut self, window_start: u64) {
        self.state = BreakerState::Closed;
        self.opened_at = None;
        self.window_start = window_start;
    }

    /// Close the breaker; only outcomes logged from `next_seq` on will count
    pub fn reset(&mut self, next_seq: u64) {
        self.close(next_seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::QueryOutcome;
    use crate::route::RoutingDecision;

    fn policy(timeout: Option<Duration>) -> BreakerPolicy {
        BreakerPolicy {
            failure_threshold: 5,
            window: 10,
            recovery_timeout: timeout,
        }
    }

    fn record(log: &mut OutcomeLog, breaker: &mut CircuitBreaker, route: Route, success: bool, policy: &BreakerPolicy) -> Option<CircuitState> {
        let decision = RoutingDecision::new(route, "test", 0.8, 1.0);
        log.push(QueryOutcome::new("q", decision, success, 1.0));
        breaker.on_outcome(log, success, policy)
    }

    #[test]
    fn test_trips_on_fifth_failure() {
        let policy = policy(None);
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..4 {
            assert_eq!(record(&mut log, &mut breaker, Route::LlmSql, false, &policy), None);
        }
        assert_eq!(breaker.state(&policy), CircuitState::Closed);

        assert_eq!(
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy),
            Some(CircuitState::Open)
        );
        assert_eq!(breaker.state(&policy), CircuitState::Open);
        assert_eq!(breaker.trips(), 1);
        assert!(breaker.snapshot(&policy).opened_at.is_some());
    }

    #[test]
    fn test_failures_outside_window_do_not_count() {
        let policy = policy(None);
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..4 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        for _ in 0..6 {
            record(&mut log, &mut breaker, Route::LlmSql, true, &policy);
        }
        // Four old failures have left the ten-outcome window
        for _ in 0..4 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        assert_eq!(breaker.state(&policy), CircuitState::Closed);
        assert_eq!(breaker.recent_failures(&log, 10), 4);
    }

    #[test]
    fn test_other_routes_are_ignored() {
        let policy = policy(None);
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..4 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        let decision = RoutingDecision::new(Route::Fallback, "test", 0.6, 0.2);
        for _ in 0..20 {
            log.push(QueryOutcome::new("q", decision.clone(), true, 0.2));
        }
        assert_eq!(breaker.recent_failures(&log, 10), 4);
    }

    #[test]
    fn test_stays_open_without_timeout() {
        let policy = policy(None);
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..5 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        assert_eq!(record(&mut log, &mut breaker, Route::LlmSql, true, &policy), None);
        assert_eq!(breaker.state(&policy), CircuitState::Open);
    }

    #[test]
    fn test_half_open_recovery() {
        let policy = policy(Some(Duration::ZERO));
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..5 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        assert_eq!(breaker.state(&policy), CircuitState::HalfOpen);
        assert!(breaker.state(&policy).allows_requests());

        // A failure while half-open re-opens at once
        assert_eq!(
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy),
            Some(CircuitState::Open)
        );
        assert_eq!(breaker.trips(), 2);

        // A success closes it and clears the old failures
        assert_eq!(
            record(&mut log, &mut breaker, Route::LlmSql, true, &policy),
            Some(CircuitState::Closed)
        );
        assert_eq!(breaker.recent_failures(&log, 10), 0);
        assert_eq!(record(&mut log, &mut breaker, Route::LlmSql, false, &policy), None);
    }

    #[test]
    fn test_reset_forgets_earlier_failures() {
        let policy = policy(None);
        let mut log = OutcomeLog::new(100);
        let mut breaker = CircuitBreaker::new(Route::LlmSql);

        for _ in 0..5 {
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy);
        }
        breaker.reset(log.next_seq());
        assert_eq!(breaker.state(&policy), CircuitState::Closed);

        for _ in 0..4 {
            assert_eq!(record(&mut log, &mut breaker, Route::LlmSql, false, &policy), None);
        }
        assert_eq!(
            record(&mut log, &mut breaker, Route::LlmSql, false, &policy),
            Some(CircuitState::Open)
        );
    }
}
