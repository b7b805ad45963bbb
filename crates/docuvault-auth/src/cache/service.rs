//! The cache facade.
//!
//! `CacheService` owns the store and tracking index and is the only
//! component that mutates them, so hit/miss accounting and index
//! bookkeeping always stay consistent with store contents. Read paths call
//! the point lookups; write paths go through
//! [`crate::invalidation::CacheInvalidator`]; the scheduler and startup
//! hook drive [`CacheService::load_all`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use arc_swap::ArcSwap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::CacheResult;
use crate::cache::statistics::{CacheStatistics, LOW_HIT_RATIO_WARNING};
use crate::cache::store::{CacheStore, keys};
use crate::cache::tracking::TrackingIndex;
use crate::config::CacheSettings;
use crate::storage::CredentialStorage;
use crate::types::{CachedApiKey, CachedBucket, CachedPermission};

// Nominal per-record footprints for the memory estimate. These are rough
// figures covering the record, its strings and the map overhead; the
// estimate feeds a health threshold, not an allocator.
const API_KEY_FOOTPRINT_BYTES: u64 = 512;
const PERMISSION_FOOTPRINT_BYTES: u64 = 160;
const BUCKET_FOOTPRINT_BYTES: u64 = 256;

/// Metadata about the most recent successful full reload, published as one
/// immutable snapshot so readers never see a half-updated pair.
#[derive(Debug, Default)]
struct ReloadInfo {
    completed_at: Option<OffsetDateTime>,
    duration_ms: Option<u64>,
}

/// Read-optimized in-memory copy of the authorization dataset.
pub struct CacheService {
    store: CacheStore,
    tracking: TrackingIndex,
    storage: Arc<dyn CredentialStorage>,
    settings: CacheSettings,

    hits: AtomicU64,
    misses: AtomicU64,
    /// Sticky: set by the first successful full reload and never unset.
    /// A later failed reload leaves the previous generation servable;
    /// staleness detection covers the drift.
    initialized: AtomicBool,
    reload_info: ArcSwap<ReloadInfo>,
}

impl CacheService {
    #[must_use]
    pub fn new(storage: Arc<dyn CredentialStorage>, settings: CacheSettings) -> Self {
        Self {
            store: CacheStore::new(),
            tracking: TrackingIndex::new(),
            storage,
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
            reload_info: ArcSwap::from_pointee(ReloadInfo::default()),
        }
    }

    /// Replace the cached dataset with a fresh copy from the persistence
    /// layer.
    ///
    /// All three bulk queries run before anything is cleared, so a storage
    /// failure leaves the current generation untouched. On success every
    /// record is stamped with one shared `cached_at` (the reload start
    /// time), the tracking index is rebuilt, and the hit/miss counters
    /// reset.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged; the caller decides whether it
    /// is fatal (process startup) or retryable (scheduled tick).
    pub async fn load_all(&self) -> CacheResult<()> {
        let started = Instant::now();
        let snapshot_at = docuvault_core::time::now_utc();

        let api_keys = self.storage.list_active_api_keys().await?;
        let permissions = self.storage.list_permissions().await?;
        let buckets = self.storage.list_active_buckets().await?;

        // Everything fetched; from here on the reload cannot fail.
        self.tracking.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        let (key_count, perm_count, bucket_count) =
            (api_keys.len(), permissions.len(), buckets.len());

        for mut record in api_keys {
            record.cached_at = snapshot_at;
            self.set_api_key(record);
        }
        for mut record in permissions {
            record.cached_at = snapshot_at;
            self.set_permission(record);
        }
        for mut record in buckets {
            record.cached_at = snapshot_at;
            self.set_bucket(record);
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        self.reload_info.store(Arc::new(ReloadInfo {
            completed_at: Some(snapshot_at),
            duration_ms: Some(duration_ms),
        }));
        self.initialized.store(true, Ordering::Relaxed);

        tracing::info!(
            api_keys = key_count,
            permissions = perm_count,
            buckets = bucket_count,
            duration_ms,
            "Authorization cache reloaded"
        );

        Ok(())
    }

    /// Whether the first full reload has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    // -------------------------------------------------------------------------
    // Point lookups
    // -------------------------------------------------------------------------

    /// Look up an API key by its public key string.
    #[must_use]
    pub fn api_key_by_key(&self, public_key: &str) -> Option<CachedApiKey> {
        let found = self.store.get_api_key(&keys::api_key_by_public(public_key));
        self.record_lookup(found.is_some(), "api_key_by_key");
        found
    }

    /// Look up an API key by its id.
    #[must_use]
    pub fn api_key_by_id(&self, id: Uuid) -> Option<CachedApiKey> {
        let found = self.store.get_api_key(&keys::api_key_by_id(id));
        self.record_lookup(found.is_some(), "api_key_by_id");
        found
    }

    /// Look up the permission grant for one `(api key, bucket)` pair.
    #[must_use]
    pub fn permission(&self, api_key_id: Uuid, bucket_id: Uuid) -> Option<CachedPermission> {
        let found = self
            .store
            .get_permission(&keys::permission(api_key_id, bucket_id));
        self.record_lookup(found.is_some(), "permission");
        found
    }

    /// Look up a bucket by id.
    #[must_use]
    pub fn bucket(&self, id: Uuid) -> Option<CachedBucket> {
        let found = self.store.get_bucket(&keys::bucket(id));
        self.record_lookup(found.is_some(), "bucket");
        found
    }

    /// Providers an API key may touch. `Some(vec![])` means unrestricted;
    /// `None` means the key is not cached.
    #[must_use]
    pub fn allowed_provider_ids(&self, api_key_id: Uuid) -> Option<Vec<Uuid>> {
        self.api_key_by_id(api_key_id)
            .map(|key| key.allowed_provider_ids)
    }

    // -------------------------------------------------------------------------
    // Point mutations
    // -------------------------------------------------------------------------

    /// Upsert an API key under both of its lookup keys.
    pub fn set_api_key(&self, record: CachedApiKey) {
        let ttl = self.settings.entry_ttl;
        self.tracking.track_api_key(record.id, record.key.clone());
        self.store
            .set_api_key(keys::api_key_by_id(record.id), record.clone(), ttl);
        self.store
            .set_api_key(keys::api_key_by_public(&record.key), record, ttl);
    }

    /// Upsert a permission grant.
    pub fn set_permission(&self, record: CachedPermission) {
        let ttl = self.settings.entry_ttl;
        self.tracking
            .track_permission(record.api_key_id, record.bucket_id);
        self.store.set_permission(
            keys::permission(record.api_key_id, record.bucket_id),
            record,
            ttl,
        );
    }

    /// Upsert a bucket.
    pub fn set_bucket(&self, record: CachedBucket) {
        let ttl = self.settings.entry_ttl;
        self.tracking.track_bucket(record.id);
        self.store
            .set_bucket(keys::bucket(record.id), record, ttl);
    }

    /// Remove an API key's entries under both lookup keys.
    ///
    /// When `public_key` is not supplied the mapping is resolved through
    /// the tracking index. Returns `false` if that mapping was already
    /// gone: the by-key entry is then orphaned until its TTL lapses, and
    /// the caller may schedule a full reload as a backstop.
    pub fn remove_api_key(&self, id: Uuid, public_key: Option<&str>) -> bool {
        let mapped = self.tracking.untrack_api_key(id);
        self.store.remove_api_key(&keys::api_key_by_id(id));

        match public_key.map(str::to_owned).or(mapped) {
            Some(key) => {
                self.store.remove_api_key(&keys::api_key_by_public(&key));
                true
            }
            None => {
                tracing::warn!(
                    api_key_id = %id,
                    "no public-key mapping for removed api key; by-key entry left to expire"
                );
                false
            }
        }
    }

    /// Remove one permission grant.
    pub fn remove_permission(&self, api_key_id: Uuid, bucket_id: Uuid) {
        self.tracking.untrack_permission(api_key_id, bucket_id);
        self.store
            .remove_permission(&keys::permission(api_key_id, bucket_id));
    }

    /// Drop the tracking bookkeeping for every grant held by one API key.
    ///
    /// Best effort now, correct after the next cycle: the store entries
    /// themselves are left for the next full reload or their TTL, since
    /// the store cannot enumerate them.
    pub fn remove_all_permissions_for_api_key(&self, api_key_id: Uuid) {
        let dropped = self.tracking.untrack_permissions_for_api_key(api_key_id);
        if dropped > 0 {
            tracing::debug!(
                api_key_id = %api_key_id,
                dropped,
                "untracked permission grants for removed api key"
            );
        }
    }

    /// Remove a bucket.
    pub fn remove_bucket(&self, id: Uuid) {
        self.tracking.untrack_bucket(id);
        self.store.remove_bucket(&keys::bucket(id));
    }

    // -------------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------------

    /// Assemble a statistics snapshot from the live counters.
    #[must_use]
    pub fn statistics(&self) -> CacheStatistics {
        let info = self.reload_info.load();
        let api_key_count = self.tracking.api_key_count();
        let permission_count = self.tracking.permission_count();
        let bucket_count = self.tracking.bucket_count();

        let mut stats = CacheStatistics {
            api_key_count,
            permission_count,
            bucket_count,
            last_reload_at: info.completed_at,
            last_reload_duration_ms: info.duration_ms,
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            // API keys occupy two store entries each.
            estimated_memory_bytes: (api_key_count as u64) * 2 * API_KEY_FOOTPRINT_BYTES
                + (permission_count as u64) * PERMISSION_FOOTPRINT_BYTES
                + (bucket_count as u64) * BUCKET_FOOTPRINT_BYTES,
            is_initialized: self.is_initialized(),
            is_healthy: false,
            warnings: Vec::new(),
        };
        stats.evaluate_health(docuvault_core::time::now_utc());

        if stats.cache_hits + stats.cache_misses > 0 && stats.hit_ratio() < LOW_HIT_RATIO_WARNING {
            stats.warnings.push(format!(
                "cache hit ratio {:.1}% is below {LOW_HIT_RATIO_WARNING:.0}%",
                stats.hit_ratio()
            ));
        }
        if stats.total_entries() > self.settings.max_entries {
            stats.warnings.push(format!(
                "cache holds {} entries, above the configured maximum of {}",
                stats.total_entries(),
                self.settings.max_entries
            ));
        }

        stats
    }

    /// The settings this service was built with.
    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    fn record_lookup(&self, hit: bool, what: &'static str) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        if self.settings.verbose_logging {
            tracing::debug!(lookup = what, hit, "cache lookup");
        }
    }

    #[cfg(test)]
    pub(crate) fn clear_tracking_for_test(&self) {
        self.tracking.clear();
    }
}
