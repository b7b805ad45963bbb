//! Health-verdict model shared by readiness and liveness probes.
//!
//! Subsystems derive a [`HealthCheck`] from their own live state; the probe
//! layer aggregates them and reports the worst verdict to the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Overall verdict a subsystem reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but outside its comfort zone; worth watching.
    Degraded,
    /// Not fit to serve; the process should be excluded from traffic.
    Unhealthy,
    /// Status could not be determined.
    Unknown,
}

impl Default for HealthStatus {
    fn default() -> Self {
        HealthStatus::Unknown
    }
}

impl HealthStatus {
    /// Ranks verdicts so aggregators can take the worst one.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Unknown => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

/// A single subsystem's health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
    #[serde(rename = "checkedAt")]
    pub checked_at: OffsetDateTime,
    pub details: HashMap<String, serde_json::Value>,
}

impl HealthCheck {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Healthy, message)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, message)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unknown, message)
    }

    fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            checked_at: crate::time::now_utc(),
            details: HashMap::new(),
        }
    }

    /// Attaches a structured detail field to the report.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self.status, HealthStatus::Unhealthy)
    }
}
