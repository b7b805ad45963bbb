//! Storage trait for authorization data.
//!
//! This module defines the persistence-layer boundary consumed by the
//! cache: three bulk queries used exclusively by full reloads. Point
//! lookups never go through this trait — a cache miss is handed back to the
//! caller, who consults the persistence layer through its own repositories.
//!
//! # Implementations
//!
//! Storage implementations live with the persistence layer (e.g. the
//! PostgreSQL backend); tests use in-memory mocks.

use async_trait::async_trait;

use crate::CacheResult;
use crate::types::{CachedApiKey, CachedBucket, CachedPermission};

/// Bulk read operations over the authorization dataset.
///
/// Implementations return snapshot rows; the `cached_at` field on every
/// returned record is overwritten by the cache with the reload's start
/// time, so implementations may leave it at any value.
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    /// List all active, non-deleted API keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_active_api_keys(&self) -> CacheResult<Vec<CachedApiKey>>;

    /// List all permission grants.
    ///
    /// Grants are returned for active and inactive keys alike; validity is
    /// evaluated at authorization time, not at load time.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_permissions(&self) -> CacheResult<Vec<CachedPermission>>;

    /// List all active buckets.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_active_buckets(&self) -> CacheResult<Vec<CachedBucket>>;
}
