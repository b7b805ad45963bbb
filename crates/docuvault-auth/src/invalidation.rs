//! Write-path invalidation entry points.
//!
//! The management services (API-key administration, bucket-permission
//! administration, bucket administration) call these hooks after every
//! successful write so the cache never serves revoked credentials for
//! longer than a moment. Every entry point is idempotent and fail-soft:
//! internal trouble falls back to a full reload, and reload failures on
//! the soft paths are logged rather than surfaced to the write-path
//! caller — the scheduled refresh guarantees eventual correctness.
//!
//! The one exception is [`CacheInvalidator::warm_up`], the startup hook:
//! serving authenticated traffic from an empty cache is unsafe, so its
//! failure propagates to the caller.

use std::sync::Arc;

use uuid::Uuid;

use crate::CacheResult;
use crate::cache::CacheService;

/// Maps external write events onto cache mutations.
pub struct CacheInvalidator {
    cache: Arc<CacheService>,
}

impl CacheInvalidator {
    #[must_use]
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }

    /// An API key was created or updated.
    ///
    /// Always a full reload: there is no incremental insert path, which
    /// keeps the dual id/key indexing strictly consistent.
    pub async fn api_key_saved(&self, id: Uuid) {
        tracing::debug!(api_key_id = %id, "api key saved; reloading cache");
        self.reload_soft("api key saved").await;
    }

    /// An API key was deleted.
    ///
    /// Point-removes both lookup entries and the key's permission
    /// bookkeeping. If the public-key mapping is already gone the by-key
    /// entry cannot be located, so a full reload is scheduled as the
    /// backstop.
    pub async fn api_key_deleted(&self, id: Uuid, public_key: Option<&str>) {
        let fully_removed = self.cache.remove_api_key(id, public_key);
        self.cache.remove_all_permissions_for_api_key(id);

        if !fully_removed {
            self.reload_soft("api key removal left an orphaned entry")
                .await;
        }
    }

    /// A permission grant was created or updated. Always a full reload.
    pub async fn permission_saved(&self, api_key_id: Uuid, bucket_id: Uuid) {
        tracing::debug!(
            api_key_id = %api_key_id,
            bucket_id = %bucket_id,
            "permission saved; reloading cache"
        );
        self.reload_soft("permission saved").await;
    }

    /// A permission grant was deleted. Precise point removal.
    pub async fn permission_deleted(&self, api_key_id: Uuid, bucket_id: Uuid) {
        self.cache.remove_permission(api_key_id, bucket_id);
    }

    /// A bucket was created, updated or deleted.
    ///
    /// On delete the bucket entry is point-removed first so it stops
    /// resolving immediately; in all cases a full reload follows, since a
    /// bucket change can ripple into permission validity.
    pub async fn bucket_changed(&self, id: Uuid, deleted: bool) {
        if deleted {
            self.cache.remove_bucket(id);
        }
        self.reload_soft("bucket changed").await;
    }

    /// Manual force-refresh hook (batch operations, admin endpoints).
    pub async fn force_refresh(&self) {
        self.reload_soft("forced refresh").await;
    }

    /// System-startup hook. Must be awaited before the process is
    /// considered ready to serve authenticated traffic.
    ///
    /// # Errors
    ///
    /// Propagates the load failure: starting with an empty authorization
    /// cache is fatal.
    pub async fn warm_up(&self) -> CacheResult<()> {
        self.cache.load_all().await?;
        tracing::info!("authorization cache warmed up");
        Ok(())
    }

    async fn reload_soft(&self, reason: &'static str) {
        if let Err(error) = self.cache.load_all().await {
            tracing::error!(
                reason,
                error = %error,
                "cache reload failed; next scheduled refresh will correct it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheSettings;
    use crate::error::AuthCacheError;
    use crate::storage::CredentialStorage;
    use crate::types::{ApiKeyTier, CachedApiKey, CachedBucket, CachedPermission, PermissionLevel};
    use async_trait::async_trait;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MutableStorage {
        api_keys: RwLock<Vec<CachedApiKey>>,
        permissions: RwLock<Vec<CachedPermission>>,
        buckets: RwLock<Vec<CachedBucket>>,
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    impl MutableStorage {
        fn new() -> Self {
            Self {
                api_keys: RwLock::new(Vec::new()),
                permissions: RwLock::new(Vec::new()),
                buckets: RwLock::new(Vec::new()),
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CredentialStorage for MutableStorage {
        async fn list_active_api_keys(&self) -> crate::CacheResult<Vec<CachedApiKey>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthCacheError::storage("down"));
            }
            Ok(self.api_keys.read().unwrap().clone())
        }

        async fn list_permissions(&self) -> crate::CacheResult<Vec<CachedPermission>> {
            Ok(self.permissions.read().unwrap().clone())
        }

        async fn list_active_buckets(&self) -> crate::CacheResult<Vec<CachedBucket>> {
            Ok(self.buckets.read().unwrap().clone())
        }
    }

    fn create_api_key(public_key: &str) -> CachedApiKey {
        CachedApiKey {
            id: Uuid::new_v4(),
            key: public_key.to_string(),
            secret_hash: "hash".to_string(),
            owner_id: Uuid::new_v4(),
            tier: ApiKeyTier::ReadOnly,
            is_active: true,
            expires_at: None,
            last_used_at: None,
            allowed_provider_ids: Vec::new(),
            cached_at: docuvault_core::time::now_utc(),
        }
    }

    fn create_permission(api_key_id: Uuid, bucket_id: Uuid) -> CachedPermission {
        CachedPermission {
            api_key_id,
            bucket_id,
            level: PermissionLevel::ReadWrite,
            granted_by: Uuid::new_v4(),
            granted_at: docuvault_core::time::now_utc(),
            cached_at: docuvault_core::time::now_utc(),
        }
    }

    fn setup(storage: Arc<MutableStorage>) -> (Arc<CacheService>, CacheInvalidator) {
        let cache = Arc::new(CacheService::new(storage, CacheSettings::for_testing()));
        let invalidator = CacheInvalidator::new(cache.clone());
        (cache, invalidator)
    }

    #[tokio::test]
    async fn test_api_key_saved_triggers_reload() {
        let storage = Arc::new(MutableStorage::new());
        let record = create_api_key("dv_new");
        storage.api_keys.write().unwrap().push(record.clone());

        let (cache, invalidator) = setup(storage.clone());
        invalidator.api_key_saved(record.id).await;

        assert_eq!(storage.loads.load(Ordering::SeqCst), 1);
        assert!(cache.api_key_by_key("dv_new").is_some());
    }

    #[tokio::test]
    async fn test_api_key_deleted_removes_key_and_grants() {
        let storage = Arc::new(MutableStorage::new());
        let (cache, invalidator) = setup(storage.clone());

        let record = create_api_key("dv_gone");
        let bucket_id = Uuid::new_v4();
        cache.set_api_key(record.clone());
        cache.set_permission(create_permission(record.id, bucket_id));

        invalidator
            .api_key_deleted(record.id, Some("dv_gone"))
            .await;

        assert!(cache.api_key_by_id(record.id).is_none());
        assert!(cache.api_key_by_key("dv_gone").is_none());
        assert_eq!(cache.statistics().permission_count, 0);
        // Precise removal: no reload needed.
        assert_eq!(storage.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_key_deleted_falls_back_to_reload_on_orphan() {
        let storage = Arc::new(MutableStorage::new());
        let (cache, invalidator) = setup(storage.clone());

        let record = create_api_key("dv_orphaned");
        cache.set_api_key(record.clone());
        cache.clear_tracking_for_test();

        invalidator.api_key_deleted(record.id, None).await;

        // The mapping was gone, so the invalidator reloaded; the reload
        // returned no keys and the orphan is no longer tracked.
        assert_eq!(storage.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.statistics().api_key_count, 0);
    }

    #[tokio::test]
    async fn test_permission_deleted_is_point_removal() {
        let storage = Arc::new(MutableStorage::new());
        let (cache, invalidator) = setup(storage.clone());

        let api_key_id = Uuid::new_v4();
        let bucket_id = Uuid::new_v4();
        cache.set_permission(create_permission(api_key_id, bucket_id));

        invalidator.permission_deleted(api_key_id, bucket_id).await;

        assert!(cache.permission(api_key_id, bucket_id).is_none());
        assert_eq!(storage.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bucket_deleted_removes_then_reloads() {
        let storage = Arc::new(MutableStorage::new());
        let (cache, invalidator) = setup(storage.clone());

        let bucket = CachedBucket {
            id: Uuid::new_v4(),
            path: "documents/trash".to_string(),
            provider_id: Uuid::new_v4(),
            is_active: true,
            is_default: false,
            description: None,
            cached_at: docuvault_core::time::now_utc(),
        };
        cache.set_bucket(bucket.clone());

        invalidator.bucket_changed(bucket.id, true).await;

        assert!(cache.bucket(bucket.id).is_none());
        assert_eq!(storage.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_soft_reload_failure_is_swallowed() {
        let storage = Arc::new(MutableStorage::new());
        storage.fail.store(true, Ordering::SeqCst);
        let (cache, invalidator) = setup(storage.clone());

        // Must not panic or propagate.
        invalidator.force_refresh().await;
        invalidator.permission_saved(Uuid::new_v4(), Uuid::new_v4()).await;

        assert!(!cache.is_initialized());
    }

    #[tokio::test]
    async fn test_warm_up_propagates_failure() {
        let storage = Arc::new(MutableStorage::new());
        storage.fail.store(true, Ordering::SeqCst);
        let (_, invalidator) = setup(storage);

        let result = invalidator.warm_up().await;
        assert!(matches!(result, Err(AuthCacheError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_warm_up_initializes() {
        let storage = Arc::new(MutableStorage::new());
        let (cache, invalidator) = setup(storage);

        invalidator.warm_up().await.unwrap();
        assert!(cache.is_initialized());
    }
}
