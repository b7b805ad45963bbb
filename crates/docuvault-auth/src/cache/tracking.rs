//! Auxiliary index of what is currently cached.
//!
//! [`crate::cache::CacheStore`] supports only per-key operations, so this
//! index duplicates the set of live keys to make the cached dataset
//! enumerable and countable without touching the store's expiry machinery:
//!
//! - id → public-key mapping for API keys (needed to remove the by-key
//!   entry when only the id is known)
//! - the set of `(api_key_id, bucket_id)` permission composite keys
//! - the set of cached bucket ids
//!
//! `clear()` resets only this index. Store entries are left to be
//! overwritten by the next reload or to expire through their TTL; there is
//! no atomic "clear all" across both structures.

use dashmap::{DashMap, DashSet};
use uuid::Uuid;

/// Concurrent bookkeeping for the cached dataset.
pub struct TrackingIndex {
    api_keys: DashMap<Uuid, String>,
    permissions: DashSet<(Uuid, Uuid)>,
    buckets: DashSet<Uuid>,
}

impl TrackingIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_keys: DashMap::new(),
            permissions: DashSet::new(),
            buckets: DashSet::new(),
        }
    }

    /// Record that an API key is cached under both of its lookup keys.
    pub fn track_api_key(&self, id: Uuid, public_key: String) {
        self.api_keys.insert(id, public_key);
    }

    /// Forget an API key, returning the public key it was mapped to.
    ///
    /// `None` means the mapping was already gone; the caller cannot locate
    /// the by-key store entry and must leave it to expire.
    pub fn untrack_api_key(&self, id: Uuid) -> Option<String> {
        self.api_keys.remove(&id).map(|(_, key)| key)
    }

    /// Look up the public key an id maps to without removing the mapping.
    #[must_use]
    pub fn public_key_for(&self, id: Uuid) -> Option<String> {
        self.api_keys.get(&id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn api_key_count(&self) -> usize {
        self.api_keys.len()
    }

    pub fn track_permission(&self, api_key_id: Uuid, bucket_id: Uuid) {
        self.permissions.insert((api_key_id, bucket_id));
    }

    pub fn untrack_permission(&self, api_key_id: Uuid, bucket_id: Uuid) {
        self.permissions.remove(&(api_key_id, bucket_id));
    }

    /// Forget every grant bookkept for one API key, returning how many
    /// mappings were dropped. The underlying store entries are not touched.
    pub fn untrack_permissions_for_api_key(&self, api_key_id: Uuid) -> usize {
        let stale: Vec<(Uuid, Uuid)> = self
            .permissions
            .iter()
            .filter(|entry| entry.0 == api_key_id)
            .map(|entry| *entry)
            .collect();
        for key in &stale {
            self.permissions.remove(key);
        }
        stale.len()
    }

    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    pub fn track_bucket(&self, id: Uuid) {
        self.buckets.insert(id);
    }

    pub fn untrack_bucket(&self, id: Uuid) {
        self.buckets.remove(&id);
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Reset the index. Store entries are intentionally left in place.
    pub fn clear(&self) {
        self.api_keys.clear();
        self.permissions.clear();
        self.buckets.clear();
    }
}

impl Default for TrackingIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_tracking_round_trip() {
        let index = TrackingIndex::new();
        let id = Uuid::new_v4();

        index.track_api_key(id, "dv_key".to_string());
        assert_eq!(index.api_key_count(), 1);
        assert_eq!(index.public_key_for(id).as_deref(), Some("dv_key"));

        assert_eq!(index.untrack_api_key(id).as_deref(), Some("dv_key"));
        assert_eq!(index.api_key_count(), 0);
        assert_eq!(index.untrack_api_key(id), None);
    }

    #[test]
    fn test_permission_tracking() {
        let index = TrackingIndex::new();
        let key_a = Uuid::new_v4();
        let key_b = Uuid::new_v4();
        let bucket_1 = Uuid::new_v4();
        let bucket_2 = Uuid::new_v4();

        index.track_permission(key_a, bucket_1);
        index.track_permission(key_a, bucket_2);
        index.track_permission(key_b, bucket_1);
        assert_eq!(index.permission_count(), 3);

        // Re-tracking the same composite key is a no-op.
        index.track_permission(key_a, bucket_1);
        assert_eq!(index.permission_count(), 3);

        assert_eq!(index.untrack_permissions_for_api_key(key_a), 2);
        assert_eq!(index.permission_count(), 1);

        index.untrack_permission(key_b, bucket_1);
        assert_eq!(index.permission_count(), 0);
    }

    #[test]
    fn test_bucket_tracking() {
        let index = TrackingIndex::new();
        let id = Uuid::new_v4();

        index.track_bucket(id);
        assert_eq!(index.bucket_count(), 1);

        index.untrack_bucket(id);
        assert_eq!(index.bucket_count(), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let index = TrackingIndex::new();
        index.track_api_key(Uuid::new_v4(), "k".to_string());
        index.track_permission(Uuid::new_v4(), Uuid::new_v4());
        index.track_bucket(Uuid::new_v4());

        index.clear();

        assert_eq!(index.api_key_count(), 0);
        assert_eq!(index.permission_count(), 0);
        assert_eq!(index.bucket_count(), 0);
    }
}
