//! # Query Router
//!
//! Chooses how a natural-language question is answered:
//!
//! - `RULE_BASED` for simple listings the rule engine handles directly
//! - `LLM_SQL` for aggregate and analytical questions with a good track record
//! - `FALLBACK` for everything else, and whenever the LLM path is unavailable
//!
//! Every executed query reports back a [`QueryOutcome`]. The outcome log
//! drives the historical score of similar queries, the per-route
//! [`ServiceMetrics`], the [`PerformanceInsights`] report and the circuit
//! breaker guarding `LLM_SQL`.

pub mod circuit_breaker;
pub mod complexity;
pub mod health;
pub mod insights;
pub mod outcome;
pub mod route;
pub mod service_metrics;
pub mod similarity;
pub mod telemetry;
mod router;

pub use circuit_breaker::{BreakerPolicy, CircuitBreaker, CircuitSnapshot, CircuitState};
pub use complexity::{ComplexityRules, QueryComplexity};
pub use health::{Backend, HealthProbe, HealthStatus, ServiceStatus};
pub use insights::PerformanceInsights;
pub use outcome::{OutcomeLog, QueryOutcome};
pub use route::{Route, RoutingDecision};
pub use router::AvailabilityRouter;
pub use service_metrics::ServiceMetrics;
pub use similarity::{SimilarityMatcher, TokenOverlap};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::circuit_breaker::CircuitState;
    pub use crate::health::{HealthProbe, HealthStatus};
    pub use crate::outcome::QueryOutcome;
    pub use crate::route::{Route, RoutingDecision};
    pub use crate::router::AvailabilityRouter;
}

/// Version of the router library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
