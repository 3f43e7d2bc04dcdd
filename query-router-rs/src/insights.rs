//! Aggregate performance report over the outcome log

use crate::outcome::OutcomeLog;
use crate::route::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LOW_SUCCESS_RATE: f64 = 0.8;
const HIGH_FALLBACK_SHARE: f64 = 0.5;
const SLOW_AVERAGE_SECONDS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    pub total_queries: usize,
    pub success_rate: f64,
    pub average_execution_time: f64,
    pub route_distribution: BTreeMap<Route, usize>,
    pub error_breakdown: BTreeMap<String, usize>,
    pub circuit_breaker_active: bool,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl PerformanceInsights {
    pub fn compute(log: &OutcomeLog, circuit_breaker_active: bool) -> Self {
        let total = log.len();
        let mut successes = 0usize;
        let mut time_sum = 0.0;
        let mut route_distribution: BTreeMap<Route, usize> = BTreeMap::new();
        let mut error_breakdown: BTreeMap<String, usize> = BTreeMap::new();

        for outcome in log.iter() {
            time_sum += outcome.execution_time_seconds;
            *route_distribution.entry(outcome.route()).or_insert(0) += 1;

            if outcome.success {
                successes += 1;
            } else {
                let error = outcome.error_type.clone().unwrap_or_else(|| "unknown".to_string());
                *error_breakdown.entry(error).or_insert(0) += 1;
            }
        }

        let (success_rate, average_execution_time) = if total == 0 {
            (1.0, 0.0)
        } else {
            (successes as f64 / total as f64, time_sum / total as f64)
        };

        let mut recommendations = Vec::new();
        if total == 0 {
            recommendations.push("No query outcomes recorded yet".to_string());
        } else {
            if success_rate < LOW_SUCCESS_RATE {
                recommendations.push(format!(
                    "Success rate low ({:.0}%): review failing queries and backend health",
                    success_rate * 100.0
                ));
            }
            let fallbacks = route_distribution.get(&Route::Fallback).copied().unwrap_or(0);
            if fallbacks as f64 / total as f64 > HIGH_FALLBACK_SHARE {
                recommendations.push(
                    "Most queries use the fallback route: consider adding rule-based patterns".to_string(),
                );
            }
            if average_execution_time > SLOW_AVERAGE_SECONDS {
                recommendations.push(format!(
                    "Average execution time is high ({:.1}s): consider simpler queries or caching",
                    average_execution_time
                ));
            }
        }
        if circuit_breaker_active {
            recommendations.push(
                "Circuit breaker active for LLM_SQL: investigate LLM backend failures".to_string(),
            );
        }

        Self {
            total_queries: total,
            success_rate,
            average_execution_time,
            route_distribution,
            error_breakdown,
            circuit_breaker_active,
            recommendations,
            generated_at: Utc::now(),
        }
    }

    pub fn has_recommendation(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.recommendations
            .iter()
            .any(|r| r.to_lowercase().contains(&fragment))
    }
}
