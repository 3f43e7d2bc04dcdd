//! # Query Guard
//!
//! One entry point for the whole query safety pipeline:
//!
//! ```text
//! raw text ─► InputSanitizer ─► AvailabilityRouter ─► backend ─► SqlValidator ─► execution
//!                 │ reject                                           │ block
//!                 ▼                                                  ▼
//!              rephrase                                           fallback
//!                        outcome ─► AvailabilityRouter::record_outcome
//! ```
//!
//! Only a blocked SQL statement surfaces as an error; input threats, quality
//! issues and backend unavailability are all returned as values.

mod errors;
mod guard;
pub mod logging;

pub use errors::{GuardError, GuardResult};
pub use guard::{QueryGuard, Screening};
pub use logging::init_logging;

pub use config_rs::GuardConfig;
pub use input_sanitizer::{RiskLevel, ThreatTag, ValidationResult};
pub use query_router::{QueryOutcome, Route, RoutingDecision};
pub use sql_validator::{SecurityLevel, SqlAnalysis, SqlSecurityError, ValidationStatus};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::errors::{GuardError, GuardResult};
    pub use crate::guard::{QueryGuard, Screening};
    pub use input_sanitizer::prelude::*;
    pub use query_router::prelude::*;
    pub use sql_validator::prelude::*;
}

/// Version of the pipeline library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
