//! Bounded per-artifact validation history

use dashmap::DashMap;
use forge_artifact::ValidationResult;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct ArtifactHistory {
    results: VecDeque<ValidationResult>,
    trend: VecDeque<f64>,
    /// Sequence number of the latest record
    touched: u64,
}

/// Last results and scores per artifact id, evicted FIFO
///
/// The number of tracked ids is capped too; past the cap the id whose
/// latest record is oldest is forgotten.
#[derive(Debug)]
pub(crate) struct ValidationHistory {
    entries: DashMap<String, ArtifactHistory>,
    sequence: AtomicU64,
    history_limit: usize,
    trend_limit: usize,
    tracked_limit: usize,
}

impl ValidationHistory {
    pub(crate) fn new(history_limit: usize, trend_limit: usize, tracked_limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            sequence: AtomicU64::new(0),
            history_limit,
            trend_limit,
            tracked_limit,
        }
    }

    /// Set `improvement_score` against the previous entry, then append
    ///
    /// Both happen under the entry lock, so concurrent validations of one
    /// artifact each see a distinct predecessor.
    pub(crate) fn record(&self, result: &mut ValidationResult) {
        let mut entry = self.entries.entry(result.artifact_id.clone()).or_default();
        result.improvement_score = entry
            .results
            .back()
            .map_or(0.0, |previous| result.overall_score - previous.overall_score);

        entry.results.push_back(result.clone());
        while entry.results.len() > self.history_limit {
            entry.results.pop_front();
        }
        entry.trend.push_back(result.overall_score);
        while entry.trend.len() > self.trend_limit {
            entry.trend.pop_front();
        }
        entry.touched = self.sequence.fetch_add(1, Ordering::Relaxed);
        drop(entry);

        self.evict_stale();
    }

    /// Forget least recently recorded ids until within the cap
    fn evict_stale(&self) {
        while self.entries.len() > self.tracked_limit {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|h| h.touched)
                .map(|h| (h.key().clone(), h.touched));
            let Some((id, touched)) = oldest else {
                return;
            };
            // Skip if another record touched it since the scan
            self.entries.remove_if(&id, |_, h| h.touched == touched);
        }
    }

    pub(crate) fn results(&self, id: &str) -> Vec<ValidationResult> {
        self.entries
            .get(id)
            .map(|h| h.results.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn trend(&self, id: &str) -> Vec<f64> {
        self.entries
            .get(id)
            .map(|h| h.trend.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }
}
