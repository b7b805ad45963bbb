//! Cached record types.
//!
//! These are snapshot copies of the authorization data held by the
//! persistence layer. Each record carries a `cached_at` timestamp: during a
//! full reload every record receives the reload's start time, while point
//! invalidations touch only the affected record.

pub mod api_key;
pub mod bucket;
pub mod permission;

pub use api_key::{ApiKeyTier, CachedApiKey};
pub use bucket::CachedBucket;
pub use permission::{CachedPermission, PermissionLevel};
