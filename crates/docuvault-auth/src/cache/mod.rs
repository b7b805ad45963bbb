//! The authorization cache proper.
//!
//! - [`store`] - per-key TTL'd record storage (no enumeration, no bulk clear)
//! - [`tracking`] - auxiliary index of what is currently cached
//! - [`service`] - the facade: reloads, lookups, mutations, statistics
//! - [`statistics`] - the live-statistics model exposed to probes

pub mod service;
pub mod statistics;
pub mod store;
pub mod tracking;

pub use service::CacheService;
pub use statistics::CacheStatistics;
pub use store::CacheStore;
pub use tracking::TrackingIndex;
