//! Search result cache using moka
//!
//! Keys carry the library generation, so a result computed against an
//! older pattern set can never answer a lookup made after a mutation even
//! if it lands in the cache late.

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::search::{PatternMatch, SearchKey};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCacheStats {
    /// Approximate number of cached searches
    pub entry_count: u64,
}

/// Outcome of a cache lookup
#[derive(Debug)]
pub(crate) struct CacheLookup {
    pub(crate) matches: Arc<Vec<PatternMatch>>,
    /// This call computed the value
    pub(crate) fresh: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct SearchCache {
    inner: Cache<SearchKey, Arc<Vec<PatternMatch>>>,
}

impl SearchCache {
    pub(crate) fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get or compute; concurrent callers for one key share a computation
    pub(crate) async fn get_or_compute<F>(&self, key: SearchKey, compute: F) -> CacheLookup
    where
        F: Future<Output = Vec<PatternMatch>>,
    {
        let entry = self
            .inner
            .entry(key)
            .or_insert_with(async move { Arc::new(compute.await) })
            .await;
        let fresh = entry.is_fresh();
        CacheLookup {
            matches: entry.into_value(),
            fresh,
        }
    }

    pub(crate) fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    pub(crate) async fn stats(&self) -> SearchCacheStats {
        self.inner.run_pending_tasks().await;
        SearchCacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}
