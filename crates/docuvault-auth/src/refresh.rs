//! Background refresh and health-check scheduling.
//!
//! One long-lived task drives both cadences: a full reload every
//! `refresh_interval` and a health inspection every
//! `health_check_interval`. The health tick can force an out-of-band
//! reload when the cache is uninitialized or badly stale; otherwise it
//! only logs.
//!
//! # Example
//!
//! ```ignore
//! use docuvault_auth::{CacheService, CacheSettings, RefreshScheduler};
//! use std::sync::Arc;
//!
//! let scheduler = Arc::new(RefreshScheduler::new(cache, CacheSettings::default()));
//! let handle = tokio::spawn({
//!     let scheduler = scheduler.clone();
//!     async move { scheduler.run().await }
//! });
//!
//! // ... at shutdown:
//! scheduler.shutdown();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::CacheService;
use crate::config::CacheSettings;

/// A scheduled reload slower than this is logged as a warning.
const SLOW_RELOAD_WARNING: Duration = Duration::from_secs(5);

/// An unhealthy cache staler than this triggers a forced out-of-band
/// reload from the health tick.
const FORCED_RELOAD_STALENESS: time::Duration = time::Duration::hours(2);

/// Hit ratio below which the health tick logs a warning (never a reload).
const HIT_RATIO_LOG_FLOOR: f64 = 70.0;

/// Memory estimate above which the health tick logs a warning.
const MEMORY_LOG_CEILING_BYTES: u64 = 200 * 1024 * 1024;

/// Counters describing what the scheduler has done so far.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Reload attempts, scheduled and forced alike.
    pub reload_attempts: u64,
    pub successful_reloads: u64,
    pub failed_reloads: u64,
    pub health_ticks: u64,
}

/// Drives periodic full reloads and independent health checks.
pub struct RefreshScheduler {
    cache: Arc<CacheService>,
    settings: CacheSettings,

    /// Flag to signal cooperative shutdown. In-flight reloads are allowed
    /// to finish or fail naturally, never aborted.
    shutdown: AtomicBool,

    reload_attempts: AtomicU64,
    successful_reloads: AtomicU64,
    failed_reloads: AtomicU64,
    health_ticks: AtomicU64,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(cache: Arc<CacheService>, settings: CacheSettings) -> Self {
        Self {
            cache,
            settings,
            shutdown: AtomicBool::new(false),
            reload_attempts: AtomicU64::new(0),
            successful_reloads: AtomicU64::new(0),
            failed_reloads: AtomicU64::new(0),
            health_ticks: AtomicU64::new(0),
        }
    }

    /// Run the scheduler until [`RefreshScheduler::shutdown`] is called.
    ///
    /// Waits the configured initial delay, performs one load (failure is
    /// logged and retried at the next tick, not fatal), then alternates
    /// between the two cadences.
    pub async fn run(&self) {
        tokio::time::sleep(self.settings.initial_load_delay).await;
        if self.shutdown.load(Ordering::Relaxed) {
            return;
        }

        tracing::info!("performing initial authorization cache load");
        self.reload("initial load").await;

        let mut last_refresh = Instant::now();
        let mut last_health_check = Instant::now();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("cache refresh scheduler shutting down");
                break;
            }

            let refresh_in = self
                .settings
                .refresh_interval
                .saturating_sub(last_refresh.elapsed());
            let health_in = self
                .settings
                .health_check_interval
                .saturating_sub(last_health_check.elapsed());

            tokio::select! {
                () = tokio::time::sleep(refresh_in) => {
                    self.reload("scheduled refresh").await;
                    last_refresh = Instant::now();
                }
                () = tokio::time::sleep(health_in) => {
                    self.health_tick().await;
                    last_health_check = Instant::now();
                }
            }
        }
    }

    /// Signal the scheduler to stop after the current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if the scheduler is shutting down.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Get the scheduler's counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            reload_attempts: self.reload_attempts.load(Ordering::Relaxed),
            successful_reloads: self.successful_reloads.load(Ordering::Relaxed),
            failed_reloads: self.failed_reloads.load(Ordering::Relaxed),
            health_ticks: self.health_ticks.load(Ordering::Relaxed),
        }
    }

    async fn reload(&self, reason: &'static str) {
        self.reload_attempts.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        match self.cache.load_all().await {
            Ok(()) => {
                self.successful_reloads.fetch_add(1, Ordering::Relaxed);
                let elapsed = started.elapsed();
                if elapsed > SLOW_RELOAD_WARNING {
                    tracing::warn!(
                        reason,
                        duration_ms = elapsed.as_millis() as u64,
                        "authorization cache reload was slow"
                    );
                }
            }
            Err(error) => {
                self.failed_reloads.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    reason,
                    error = %error,
                    "authorization cache reload failed; retrying on next tick"
                );
            }
        }
    }

    async fn health_tick(&self) {
        self.health_ticks.fetch_add(1, Ordering::Relaxed);
        let stats = self.cache.statistics();

        if !stats.is_initialized {
            tracing::warn!("authorization cache uninitialized; forcing reload");
            self.reload("uninitialized cache").await;
            return;
        }

        let staleness = stats.staleness(docuvault_core::time::now_utc());
        if !stats.is_healthy && staleness.is_some_and(|age| age > FORCED_RELOAD_STALENESS) {
            tracing::warn!(
                staleness_minutes = staleness.map_or(0, time::Duration::whole_minutes),
                "authorization cache badly stale; forcing reload"
            );
            self.reload("stale cache").await;
            return;
        }

        let total_lookups = stats.cache_hits + stats.cache_misses;
        if total_lookups > 0 && stats.hit_ratio() < HIT_RATIO_LOG_FLOOR {
            tracing::warn!(
                hit_ratio = stats.hit_ratio(),
                hits = stats.cache_hits,
                misses = stats.cache_misses,
                "authorization cache hit ratio is low"
            );
        }
        if stats.estimated_memory_bytes > MEMORY_LOG_CEILING_BYTES {
            tracing::warn!(
                estimated_memory_bytes = stats.estimated_memory_bytes,
                "authorization cache memory estimate is high"
            );
        }

        if self.settings.statistics_enabled {
            tracing::debug!(
                api_keys = stats.api_key_count,
                permissions = stats.permission_count,
                buckets = stats.bucket_count,
                hit_ratio = stats.hit_ratio(),
                healthy = stats.is_healthy,
                "authorization cache statistics"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheResult;
    use crate::storage::CredentialStorage;
    use crate::types::{CachedApiKey, CachedBucket, CachedPermission};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingStorage {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingStorage {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialStorage for CountingStorage {
        async fn list_active_api_keys(&self) -> CacheResult<Vec<CachedApiKey>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(crate::AuthCacheError::storage("unavailable"));
            }
            Ok(Vec::new())
        }

        async fn list_permissions(&self) -> CacheResult<Vec<CachedPermission>> {
            Ok(Vec::new())
        }

        async fn list_active_buckets(&self) -> CacheResult<Vec<CachedBucket>> {
            Ok(Vec::new())
        }
    }

    fn scheduler_with(storage: Arc<CountingStorage>) -> Arc<RefreshScheduler> {
        let settings = CacheSettings::for_testing();
        let cache = Arc::new(CacheService::new(storage, settings.clone()));
        Arc::new(RefreshScheduler::new(cache, settings))
    }

    #[tokio::test]
    async fn test_initial_load_and_scheduled_refreshes() {
        let storage = Arc::new(CountingStorage::new());
        let scheduler = scheduler_with(storage.clone());

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run().await }
        });

        // Enough time for the initial load plus at least one refresh tick.
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown();
        let _ = tokio::time::timeout(Duration::from_millis(500), handle).await;

        assert!(storage.calls() >= 2);
        let stats = scheduler.stats();
        assert!(stats.reload_attempts >= 2);
        assert!(stats.successful_reloads >= 2);
        assert_eq!(stats.failed_reloads, 0);
    }

    #[tokio::test]
    async fn test_failed_initial_load_does_not_stop_scheduler() {
        let storage = Arc::new(CountingStorage::new());
        storage.fail.store(true, Ordering::SeqCst);
        let scheduler = scheduler_with(storage.clone());

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run().await }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown();
        let _ = tokio::time::timeout(Duration::from_millis(500), handle).await;

        // The initial load failed, and the scheduler kept retrying: either
        // on the refresh cadence or forced by the uninitialized health tick.
        let stats = scheduler.stats();
        assert!(stats.failed_reloads >= 2);
        assert_eq!(stats.successful_reloads, 0);
        assert!(storage.calls() >= 2);
    }

    #[tokio::test]
    async fn test_health_tick_forces_reload_when_uninitialized() {
        let storage = Arc::new(CountingStorage::new());
        let settings = CacheSettings::for_testing();
        let cache = Arc::new(CacheService::new(storage.clone(), settings.clone()));
        let scheduler = RefreshScheduler::new(cache.clone(), settings);

        assert!(!cache.is_initialized());
        scheduler.health_tick().await;

        assert!(cache.is_initialized());
        assert_eq!(scheduler.stats().reload_attempts, 1);
        assert_eq!(storage.calls(), 1);
    }

    #[tokio::test]
    async fn test_health_tick_leaves_healthy_cache_alone() {
        let storage = Arc::new(CountingStorage::new());
        let settings = CacheSettings::for_testing();
        let cache = Arc::new(CacheService::new(storage.clone(), settings.clone()));
        cache.load_all().await.unwrap();
        let calls_after_load = storage.calls();

        let scheduler = RefreshScheduler::new(cache, settings);
        scheduler.health_tick().await;

        assert_eq!(storage.calls(), calls_after_load);
        assert_eq!(scheduler.stats().health_ticks, 1);
        assert_eq!(scheduler.stats().reload_attempts, 0);
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let storage = Arc::new(CountingStorage::new());
        let scheduler = scheduler_with(storage);

        assert!(!scheduler.is_shutting_down());
        scheduler.shutdown();
        assert!(scheduler.is_shutting_down());
    }
}
