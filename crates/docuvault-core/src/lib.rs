//! # docuvault-core
//!
//! Core shared types for the DocuVault server.
//!
//! This crate provides:
//! - UTC time helpers used by every subsystem that timestamps data
//! - The health-verdict model consumed by readiness/liveness probes

pub mod health;
pub mod time;

pub use health::{HealthCheck, HealthStatus};
pub use time::now_utc;
