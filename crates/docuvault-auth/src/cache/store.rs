//! Per-key record storage with per-entry expiry.
//!
//! The store deliberately exposes only per-key operations: `set`, `get`
//! and `remove`. There is no enumeration and no bulk clear — superseded
//! entries are either overwritten by the next reload or age out through
//! their TTL. Enumeration concerns live in
//! [`crate::cache::TrackingIndex`].
//!
//! Expiry is lazy: an entry past its deadline is dropped by the `get` that
//! finds it and reported as a miss.

use dashmap::DashMap;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::{CachedApiKey, CachedBucket, CachedPermission};

/// Builders for the string keys under which records are stored.
///
/// API keys are dual-indexed: one entry under the id, one under the public
/// key string. The two entries are always written and removed together by
/// the cache service.
pub mod keys {
    use super::Uuid;

    #[must_use]
    pub fn api_key_by_id(id: Uuid) -> String {
        format!("apikey:id:{id}")
    }

    #[must_use]
    pub fn api_key_by_public(key: &str) -> String {
        format!("apikey:key:{key}")
    }

    #[must_use]
    pub fn permission(api_key_id: Uuid, bucket_id: Uuid) -> String {
        format!("perm:{api_key_id}:{bucket_id}")
    }

    #[must_use]
    pub fn bucket(id: Uuid) -> String {
        format!("bucket:{id}")
    }
}

struct Entry<V> {
    value: V,
    expires_at: OffsetDateTime,
}

impl<V> Entry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: docuvault_core::time::now_utc() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at <= docuvault_core::time::now_utc()
    }
}

/// Concurrency-safe key/value storage for the three cached record kinds.
///
/// All maps are independent; a reload may repopulate them in any order.
pub struct CacheStore {
    api_keys: DashMap<String, Entry<CachedApiKey>>,
    permissions: DashMap<String, Entry<CachedPermission>>,
    buckets: DashMap<String, Entry<CachedBucket>>,
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_keys: DashMap::new(),
            permissions: DashMap::new(),
            buckets: DashMap::new(),
        }
    }

    pub fn set_api_key(&self, key: String, record: CachedApiKey, ttl: Duration) {
        self.api_keys.insert(key, Entry::new(record, ttl));
    }

    pub fn get_api_key(&self, key: &str) -> Option<CachedApiKey> {
        Self::get_from(&self.api_keys, key)
    }

    pub fn remove_api_key(&self, key: &str) {
        self.api_keys.remove(key);
    }

    pub fn set_permission(&self, key: String, record: CachedPermission, ttl: Duration) {
        self.permissions.insert(key, Entry::new(record, ttl));
    }

    pub fn get_permission(&self, key: &str) -> Option<CachedPermission> {
        Self::get_from(&self.permissions, key)
    }

    pub fn remove_permission(&self, key: &str) {
        self.permissions.remove(key);
    }

    pub fn set_bucket(&self, key: String, record: CachedBucket, ttl: Duration) {
        self.buckets.insert(key, Entry::new(record, ttl));
    }

    pub fn get_bucket(&self, key: &str) -> Option<CachedBucket> {
        Self::get_from(&self.buckets, key)
    }

    pub fn remove_bucket(&self, key: &str) {
        self.buckets.remove(key);
    }

    fn get_from<V: Clone>(map: &DashMap<String, Entry<V>>, key: &str) -> Option<V> {
        let expired = match map.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            // Drop the dead entry outside the read guard.
            map.remove_if(key, |_, entry| entry.is_expired());
        }
        None
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
