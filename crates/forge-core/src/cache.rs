//! Transformation cache
//!
//! Entries are keyed by artifact id and stamped with the fingerprint of
//! the input and the pattern library generation they were computed
//! against. A lookup only hits when both stamps match, so a changed
//! document or a mutated library always recomputes.
//!
//! Each id also has an advisory [`tokio::sync::Mutex`]. The generator holds
//! it from the lookup through the final write, so two transforms of one id
//! never interleave. A lock lives only while some task holds or awaits it,
//! so the lock map never outgrows the number of in-flight ids.

use dashmap::DashMap;
use forge_artifact::{Fingerprint, PhaseArtifact, ValidationResult};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformCacheStats {
    /// Approximate number of cached artifacts
    pub entry_count: u64,
    /// Ids with an advisory lock held or awaited
    pub locked_ids: usize,
}

/// Held advisory lock for one id
///
/// Dropping it releases the mutex and removes the id's slot when no other
/// task shares it.
#[derive(Debug)]
pub(crate) struct IdLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdLock<'_> {
    fn drop(&mut self) {
        // Release first so our own Arc clone no longer counts
        drop(self.guard.take());
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Input state an entry was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryVersion {
    pub(crate) input: Fingerprint,
    pub(crate) library_generation: u64,
}

/// A finished transformation
#[derive(Debug)]
pub(crate) struct CachedTransform {
    pub(crate) version: EntryVersion,
    pub(crate) artifact: PhaseArtifact,
    pub(crate) validation: ValidationResult,
    pub(crate) complexity_score: u32,
    pub(crate) warnings: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct TransformCache {
    entries: Cache<String, Arc<CachedTransform>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TransformCache {
    pub(crate) fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            locks: DashMap::new(),
        }
    }

    /// Acquire the advisory lock for `id`
    pub(crate) async fn lock(&self, id: &str) -> IdLock<'_> {
        // Clone the Arc out so no DashMap shard guard is held across the await
        let mutex = self.locks.entry(id.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        IdLock {
            locks: &self.locks,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Entry for `id` if it was computed from `version`
    pub(crate) async fn get(&self, id: &str, version: EntryVersion) -> Option<Arc<CachedTransform>> {
        self.entries
            .get(id)
            .await
            .filter(|entry| entry.version == version)
    }

    pub(crate) async fn insert(&self, id: &str, entry: CachedTransform) {
        self.entries.insert(id.to_string(), Arc::new(entry)).await;
    }

    /// Drop the entry for `id`, and its lock if nobody holds it
    pub(crate) async fn invalidate(&self, id: &str) {
        self.entries.invalidate(id).await;
        self.locks
            .remove_if(id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub(crate) fn clear(&self) {
        self.entries.invalidate_all();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub(crate) async fn stats(&self) -> TransformCacheStats {
        self.entries.run_pending_tasks().await;
        TransformCacheStats {
            entry_count: self.entries.entry_count(),
            locked_ids: self.locks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: EntryVersion) -> CachedTransform {
        CachedTransform {
            version,
            artifact: PhaseArtifact::new("p", "P", "d"),
            validation: ValidationResult::failed("p", "x"),
            complexity_score: 0,
            warnings: Vec::new(),
        }
    }

    fn version(input: &[u8], generation: u64) -> EntryVersion {
        EntryVersion {
            input: Fingerprint::compute(input),
            library_generation: generation,
        }
    }

    #[tokio::test]
    async fn hit_requires_matching_version() {
        let cache = TransformCache::new(10, Duration::from_secs(60));
        cache.insert("p", entry(version(b"a", 1))).await;

        assert!(cache.get("p", version(b"a", 1)).await.is_some());
        assert!(cache.get("p", version(b"b", 1)).await.is_none());
        assert!(cache.get("p", version(b"a", 2)).await.is_none());
        assert!(cache.get("q", version(b"a", 1)).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_drops_entry() {
        let cache = TransformCache::new(10, Duration::from_secs(60));
        cache.insert("p", entry(version(b"a", 1))).await;

        cache.invalidate("p").await;
        assert!(cache.get("p", version(b"a", 1)).await.is_none());
    }

    #[tokio::test]
    async fn released_lock_frees_its_slot() {
        let cache = TransformCache::new(10, Duration::from_secs(60));
        for id in ["a", "b", "c"] {
            let held = cache.lock(id).await;
            assert_eq!(cache.stats().await.locked_ids, 1);
            drop(held);
        }
        assert_eq!(cache.stats().await.locked_ids, 0);
    }

    #[tokio::test]
    async fn awaited_lock_keeps_its_slot() {
        let cache = Arc::new(TransformCache::new(10, Duration::from_secs(60)));
        let held = cache.lock("p").await;

        let waiter = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                let _held = cache.lock("p").await;
            }
        });
        let sharers = || cache.locks.get("p").map_or(0, |m| Arc::strong_count(m.value()));
        // map slot, our guard, and the waiter's pending acquire
        while sharers() < 3 {
            tokio::task::yield_now().await;
        }

        drop(held);
        assert_eq!(cache.locks.len(), 1);
        waiter.await.unwrap();
        assert_eq!(cache.locks.len(), 0);
    }

    #[tokio::test]
    async fn held_lock_survives_clear() {
        let cache = TransformCache::new(10, Duration::from_secs(60));
        let guard = cache.lock("p").await;
        cache.clear();
        assert_eq!(cache.stats().await.locked_ids, 1);
        drop(guard);
    }
}
