//! Live cache statistics exposed to readiness probes and operators.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The cache is considered stale, and therefore unhealthy, once the last
/// successful full reload is older than this.
pub const STALENESS_LIMIT_MINUTES: i64 = 60;

/// A hit ratio below this raises a statistics warning.
pub const LOW_HIT_RATIO_WARNING: f64 = 80.0;

/// A point-in-time snapshot of the cache's live counters.
///
/// Hit/miss counters cover the current generation only: they reset at the
/// start of every successful full reload and are untouched by point
/// invalidations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    #[serde(rename = "apiKeyCount")]
    pub api_key_count: usize,
    #[serde(rename = "permissionCount")]
    pub permission_count: usize,
    #[serde(rename = "bucketCount")]
    pub bucket_count: usize,

    /// When the last successful full reload completed.
    #[serde(rename = "lastReloadAt")]
    pub last_reload_at: Option<OffsetDateTime>,
    #[serde(rename = "lastReloadDurationMs")]
    pub last_reload_duration_ms: Option<u64>,

    #[serde(rename = "cacheHits")]
    pub cache_hits: u64,
    #[serde(rename = "cacheMisses")]
    pub cache_misses: u64,

    #[serde(rename = "estimatedMemoryBytes")]
    pub estimated_memory_bytes: u64,

    #[serde(rename = "isInitialized")]
    pub is_initialized: bool,
    #[serde(rename = "isHealthy")]
    pub is_healthy: bool,

    pub warnings: Vec<String>,
}

impl CacheStatistics {
    /// Hit ratio as a percentage of lookups in the current generation.
    /// Zero when no lookups have been recorded yet.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }

    /// Elapsed time since the last successful full reload, as seen at
    /// `now`. `None` before the first reload.
    #[must_use]
    pub fn staleness(&self, now: OffsetDateTime) -> Option<time::Duration> {
        self.last_reload_at.map(|at| now - at)
    }

    /// Recompute `is_healthy` as seen at `now`: the cache must be
    /// initialized and its last reload younger than
    /// [`STALENESS_LIMIT_MINUTES`].
    pub fn evaluate_health(&mut self, now: OffsetDateTime) {
        let fresh = self
            .staleness(now)
            .is_some_and(|age| age < time::Duration::minutes(STALENESS_LIMIT_MINUTES));
        self.is_healthy = self.is_initialized && fresh;
    }

    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.api_key_count + self.permission_count + self.bucket_count
    }
}

impl Default for CacheStatistics {
    fn default() -> Self {
        Self {
            api_key_count: 0,
            permission_count: 0,
            bucket_count: 0,
            last_reload_at: None,
            last_reload_duration_ms: None,
            cache_hits: 0,
            cache_misses: 0,
            estimated_memory_bytes: 0,
            is_initialized: false,
            is_healthy: false,
            warnings: Vec::new(),
        }
    }
}
