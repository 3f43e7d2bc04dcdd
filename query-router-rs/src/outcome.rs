//! Query outcomes and the bounded log that holds them

use crate::route::{Route, RoutingDecision};
use crate::similarity::SimilarityMatcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Result of executing one routed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub id: Uuid,
    pub query_text: String,
    pub decision: RoutingDecision,
    pub success: bool,
    pub execution_time_seconds: f64,
    /// Confidence in the answer, 0.0..=1.0; defaults to the decision's
    pub confidence_score: f64,
    pub error_type: Option<String>,
    pub user_feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl QueryOutcome {
    pub fn new<S: Into<String>>(
        query_text: S,
        decision: RoutingDecision,
        success: bool,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_text: query_text.into(),
            confidence_score: decision.confidence,
            decision,
            success,
            execution_time_seconds: execution_time_seconds.max(0.0),
            error_type: None,
            user_feedback: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_error<S: Into<String>>(mut self, error_type: S) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_feedback<S: Into<String>>(mut self, feedback: S) -> Self {
        self.user_feedback = Some(feedback.into());
        self
    }

    pub fn route(&self) -> Route {
        self.decision.route_type
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LoggedOutcome {
    pub seq: u64,
    pub outcome: QueryOutcome,
}

/// Append-only outcome history, oldest entries evicted past capacity
#[derive(Debug, Clone)]
pub struct OutcomeLog {
    entries: VecDeque<LoggedOutcome>,
    next_seq: u64,
    capacity: usize,
}

impl OutcomeLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            next_seq: 0,
            capacity,
        }
    }

    /// Append and return the outcome's sequence number
    pub fn push(&mut self, outcome: QueryOutcome) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.push_back(LoggedOutcome { seq, outcome });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence number the next outcome will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &QueryOutcome> {
        self.entries.iter().map(|e| &e.outcome)
    }

    /// Newest first, with sequence numbers
    pub(crate) fn newest_first(&self) -> impl Iterator<Item = &LoggedOutcome> {
        self.entries.iter().rev()
    }

    /// Newest first, one route only
    pub fn recent_for_route(&self, route: Route) -> impl Iterator<Item = &QueryOutcome> {
        self.iter().rev().filter(move |o| o.route() == route)
    }

    /// Up to `limit` most recent outcomes, oldest first
    pub fn recent(&self, limit: usize) -> Vec<QueryOutcome> {
        let skip = self.entries.len().saturating_sub(limit);
        self.iter().skip(skip).cloned().collect()
    }

    /// Weighted mean of the latest similar outcomes.
    ///
    /// A success contributes its confidence with weight 1.0, a failure 0.2
    /// with weight 0.3. Returns `default` when nothing similar was recorded.
    pub fn historical_score(
        &self,
        query: &str,
        matcher: &dyn SimilarityMatcher,
        window: usize,
        default: f64,
    ) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;

        for outcome in self
            .iter()
            .rev()
            .filter(|o| matcher.is_similar(query, &o.query_text))
            .take(window)
        {
            let (score, weight) = if outcome.success {
                (outcome.confidence_score, SUCCESS_WEIGHT)
            } else {
                (FAILURE_SCORE, FAILURE_WEIGHT)
            };
            weighted += score * weight;
            weights += weight;
        }

        if weights > 0.0 {
            weighted / weights
        } else {
            default
        }
    }

    /// Mean execution time of a route, if it has any outcome
    pub fn mean_execution_time(&self, route: Route) -> Option<f64> {
        let (sum, count) = self
            .recent_for_route(route)
            .fold((0.0, 0usize), |(sum, count), o| (sum + o.execution_time_seconds, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

const SUCCESS_WEIGHT: f64 = 1.0;
const FAILURE_SCORE: f64 = 0.2;
const FAILURE_WEIGHT: f64 = 0.3;
