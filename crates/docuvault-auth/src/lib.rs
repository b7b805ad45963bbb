//! # docuvault-auth
//!
//! API-key authorization cache for the DocuVault server.
//!
//! Every authenticated API call is authorized against an in-memory copy of
//! API-key credentials, per-bucket permission grants, and bucket metadata,
//! so the hot path never touches the persistent store. This crate provides:
//!
//! - A read-optimized, concurrency-safe cache over the three record kinds
//! - A periodically-scheduled full reload from the persistence layer
//! - An event-driven partial-invalidation path for write operations
//! - Staleness detection and a derived health verdict used to gate readiness
//!
//! ## Modules
//!
//! - [`config`] - Cache configuration with documented defaults
//! - [`types`] - Cached record types and their derived predicates
//! - [`storage`] - The persistence-layer boundary trait
//! - [`cache`] - The store, tracking index, service facade and statistics
//! - [`refresh`] - Background refresh and health-check scheduling
//! - [`invalidation`] - Write-path invalidation entry points
//! - [`health`] - Health verdict derivation for readiness probes
//!
//! Cache misses are a normal outcome, never an error: callers fall back to
//! the source of truth. The only loud failure path is a full reload.

pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod invalidation;
pub mod refresh;
pub mod storage;
pub mod types;

pub use cache::{CacheService, CacheStatistics, CacheStore, TrackingIndex};
pub use config::CacheSettings;
pub use error::AuthCacheError;
pub use health::HealthReporter;
pub use invalidation::CacheInvalidator;
pub use refresh::{RefreshScheduler, SchedulerStats};
pub use storage::CredentialStorage;
pub use types::{ApiKeyTier, CachedApiKey, CachedBucket, CachedPermission, PermissionLevel};

/// Type alias for authorization-cache results.
pub type CacheResult<T> = Result<T, AuthCacheError>;
