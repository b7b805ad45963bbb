//! Health evaluation for the authorization cache.
//!
//! Turns a [`CacheStatistics`] snapshot into a [`HealthCheck`] suitable
//! for the service's readiness and health endpoints. The evaluation is a
//! fixed ladder, worst rung first: an unhealthy snapshot is always
//! `Unhealthy`, any degradation signal maps to `Degraded`, and only a
//! clean snapshot reports `Healthy`.

use serde_json::json;
use time::OffsetDateTime;

use docuvault_core::health::HealthCheck;

use crate::cache::CacheStatistics;

/// Hit ratio below this is a serious degradation signal.
const CRITICAL_HIT_RATIO: f64 = 50.0;

/// Hit ratio below this degrades the check even when everything else is fine.
const LOW_HIT_RATIO: f64 = 70.0;

/// A reload slower than this degrades the check.
const SLOW_RELOAD_MS: u64 = 10_000;

/// A cache staler than this degrades the check (well before the hard
/// staleness limit flips the snapshot unhealthy).
const STALENESS_WARNING_MINUTES: i64 = 45;

/// Memory estimate above which the check degrades.
const MEMORY_LIMIT_BYTES: u64 = 200 * 1024 * 1024;

/// Stateless evaluator mapping cache statistics onto the service health
/// model.
pub struct HealthReporter;

impl HealthReporter {
    /// Evaluate a statistics snapshot as seen at `now`.
    ///
    /// First matching rung wins:
    ///
    /// 1. snapshot not healthy (uninitialized or past the staleness
    ///    limit) → `Unhealthy`
    /// 2. hit ratio below [`CRITICAL_HIT_RATIO`] with traffic recorded,
    ///    last reload slower than [`SLOW_RELOAD_MS`], staleness past
    ///    [`STALENESS_WARNING_MINUTES`], memory above
    ///    [`MEMORY_LIMIT_BYTES`], hit ratio below [`LOW_HIT_RATIO`] with
    ///    traffic recorded, or any statistics warning → `Degraded`
    /// 3. otherwise → `Healthy`
    #[must_use]
    pub fn evaluate(stats: &CacheStatistics, now: OffsetDateTime) -> HealthCheck {
        let check = Self::classify(stats, now);
        Self::attach_details(check, stats, now)
    }

    fn classify(stats: &CacheStatistics, now: OffsetDateTime) -> HealthCheck {
        if !stats.is_healthy {
            let message = if stats.is_initialized {
                "cache data is stale"
            } else {
                "cache has not completed an initial load"
            };
            return HealthCheck::unhealthy(message);
        }

        let total_lookups = stats.cache_hits + stats.cache_misses;
        let has_traffic = total_lookups > 0;
        let hit_ratio = stats.hit_ratio();
        let staleness_minutes = stats
            .staleness(now)
            .map_or(0, time::Duration::whole_minutes);

        if has_traffic && hit_ratio < CRITICAL_HIT_RATIO {
            return HealthCheck::degraded("cache hit ratio is critically low");
        }
        if stats
            .last_reload_duration_ms
            .is_some_and(|ms| ms > SLOW_RELOAD_MS)
        {
            return HealthCheck::degraded("last cache reload was slow");
        }
        if staleness_minutes > STALENESS_WARNING_MINUTES {
            return HealthCheck::degraded("cache data is aging");
        }
        if stats.estimated_memory_bytes > MEMORY_LIMIT_BYTES {
            return HealthCheck::degraded("cache memory estimate exceeds limit");
        }
        if has_traffic && hit_ratio < LOW_HIT_RATIO {
            return HealthCheck::degraded("cache hit ratio is low");
        }
        if !stats.warnings.is_empty() {
            return HealthCheck::degraded(stats.warnings.join("; "));
        }

        HealthCheck::healthy("cache operating normally")
    }

    fn attach_details(check: HealthCheck, stats: &CacheStatistics, now: OffsetDateTime) -> HealthCheck {
        check
            .with_detail("apiKeyCount", json!(stats.api_key_count))
            .with_detail("permissionCount", json!(stats.permission_count))
            .with_detail("bucketCount", json!(stats.bucket_count))
            .with_detail("hitRatio", json!(stats.hit_ratio()))
            .with_detail("cacheHits", json!(stats.cache_hits))
            .with_detail("cacheMisses", json!(stats.cache_misses))
            .with_detail(
                "stalenessMinutes",
                json!(stats.staleness(now).map(time::Duration::whole_minutes)),
            )
            .with_detail("estimatedMemoryBytes", json!(stats.estimated_memory_bytes))
            .with_detail("isInitialized", json!(stats.is_initialized))
            .with_detail("warnings", json!(stats.warnings))
    }
}
