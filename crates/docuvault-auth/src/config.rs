//! Authorization-cache configuration.
//!
//! All durations deserialize in humantime notation (`"30m"`, `"2h"`), and
//! every field carries a documented default so an empty `[auth.cache]`
//! section yields a working configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth.cache]
//! refresh_interval = "30m"
//! health_check_interval = "5m"
//! entry_ttl = "2h"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the API-key authorization cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Soft ceiling on the number of cached entries.
    /// Exceeding it raises a statistics warning; entries are never evicted
    /// for size inside this subsystem.
    pub max_entries: usize,

    /// How often the full dataset is reloaded from the persistence layer.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// How often cache health is inspected, independently of reloads.
    #[serde(with = "humantime_serde")]
    pub health_check_interval: Duration,

    /// Per-entry time-to-live. A safety net against invalidations that
    /// never reached this process, not the primary invalidation mechanism.
    #[serde(with = "humantime_serde")]
    pub entry_ttl: Duration,

    /// Delay before the first load after process start.
    #[serde(with = "humantime_serde")]
    pub initial_load_delay: Duration,

    /// Emit periodic statistics summaries from the health tick.
    pub statistics_enabled: bool,

    /// Emit a debug event for every point lookup.
    pub verbose_logging: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            refresh_interval: Duration::from_secs(30 * 60), // 30 minutes
            health_check_interval: Duration::from_secs(5 * 60), // 5 minutes
            entry_ttl: Duration::from_secs(2 * 3600),       // 2 hours
            initial_load_delay: Duration::from_secs(30),
            statistics_enabled: true,
            verbose_logging: false,
        }
    }
}

impl CacheSettings {
    /// Create a configuration for testing with fast timeouts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_entries: 1_000,
            refresh_interval: Duration::from_millis(50),
            health_check_interval: Duration::from_millis(25),
            entry_ttl: Duration::from_secs(3600),
            initial_load_delay: Duration::from_millis(5),
            statistics_enabled: true,
            verbose_logging: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::default();
        assert_eq!(settings.max_entries, 10_000);
        assert_eq!(settings.refresh_interval, Duration::from_secs(1800));
        assert_eq!(settings.health_check_interval, Duration::from_secs(300));
        assert_eq!(settings.entry_ttl, Duration::from_secs(7200));
        assert_eq!(settings.initial_load_delay, Duration::from_secs(30));
        assert!(settings.statistics_enabled);
        assert!(!settings.verbose_logging);
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let settings: CacheSettings = serde_json::from_str(
            r#"{
                "refresh_interval": "10m",
                "entry_ttl": "1h",
                "verbose_logging": true
            }"#,
        )
        .unwrap();

        assert_eq!(settings.refresh_interval, Duration::from_secs(600));
        assert_eq!(settings.entry_ttl, Duration::from_secs(3600));
        assert!(settings.verbose_logging);
        // Unspecified fields fall back to defaults.
        assert_eq!(settings.max_entries, 10_000);
    }

    #[test]
    fn test_for_testing_is_fast() {
        let settings = CacheSettings::for_testing();
        assert!(settings.refresh_interval < Duration::from_secs(1));
        assert!(settings.health_check_interval < Duration::from_secs(1));
        assert!(settings.initial_load_delay < Duration::from_secs(1));
    }
}
