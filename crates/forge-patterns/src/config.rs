//! Pattern library configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for [`crate::PatternLibrary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PatternLibraryConfig {
    /// Hard cap on stored patterns
    pub max_patterns: usize,
    /// Evict stale patterns when an add hits the cap
    pub auto_cleanup: bool,
    /// Update usage records on non-cached searches
    pub enable_learning: bool,
    /// Result cache time-to-live
    #[serde(with = "forge_artifact::duration_secs")]
    pub cache_ttl: Duration,
    /// Result cache capacity in entries
    pub cache_capacity: u64,
    /// Days without use after which a pattern counts as stale
    pub stale_after_days: i64,
    /// Patterns used at least this often are never evicted
    pub min_usage_to_keep: u64,
    /// Description overlap above which an add is a duplicate
    pub duplicate_threshold: f64,
    /// Usage count at which the usage signal saturates
    pub usage_saturation: u64,
}

impl Default for PatternLibraryConfig {
    fn default() -> Self {
        Self {
            max_patterns: 1000,
            auto_cleanup: true,
            enable_learning: true,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
            stale_after_days: 30,
            min_usage_to_keep: 5,
            duplicate_threshold: 0.9,
            usage_saturation: 10,
        }
    }
}

impl PatternLibraryConfig {
    /// With capacity
    #[inline]
    #[must_use]
    pub fn with_max_patterns(mut self, max: usize) -> Self {
        self.max_patterns = max;
        self
    }

    /// With auto cleanup toggle
    #[inline]
    #[must_use]
    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// With learning toggle
    #[inline]
    #[must_use]
    pub fn with_learning(mut self, enabled: bool) -> Self {
        self.enable_learning = enabled;
        self
    }

    /// With result cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}
