//! Backend health probing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Liveness check implemented by every backend adapter
pub trait HealthProbe: Send + Sync {
    fn is_healthy(&self) -> bool;
}

impl<F> HealthProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_healthy(&self) -> bool {
        self()
    }
}

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: ServiceStatus,
    pub healthy_services: usize,
    pub total_services: usize,
    pub issues: Vec<String>,
}

/// A probe registered under a display name
#[derive(Clone)]
pub struct Backend {
    pub name: String,
    probe: Arc<dyn HealthProbe>,
}

impl Backend {
    pub fn new<S: Into<String>>(name: S, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            name: name.into(),
            probe,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.probe.is_healthy()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}

/// Probe every backend once and summarise.
///
/// With no backend registered the status is healthy.
pub fn check_backends(backends: &[Backend]) -> HealthStatus {
    let mut issues = Vec::new();
    let mut healthy = 0;

    for backend in backends {
        if backend.is_healthy() {
            healthy += 1;
        } else {
            issues.push(format!("{} service unavailable", backend.name));
        }
    }

    let total = backends.len();
    let status = if healthy == total {
        ServiceStatus::Healthy
    } else if healthy == 0 {
        ServiceStatus::Unhealthy
    } else {
        ServiceStatus::Degraded
    };

    HealthStatus {
        status,
        healthy_services: healthy,
        total_services: total,
        issues,
    }
}
