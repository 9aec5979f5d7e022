//! The pattern library
//!
//! Patterns and their indices sit under one [`RwLock`]: a search scores
//! candidates under the read lock, so an eviction (write lock) can never
//! pull a pattern out from under a search in progress. Learning records
//! live in a [`DashMap`] beside the store and are updated per entry.
//!
//! Every structural mutation (add, update, remove, eviction, import) bumps
//! the library generation and clears the result cache. Learning updates do
//! not; they only move confidence and relevance.

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use forge_artifact::text::{overlap_of_sets, token_overlap, word_set};
use forge_artifact::{ExamplePattern, PatternEvolution};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::analytics::LibraryAnalytics;
use crate::cache::{SearchCache, SearchCacheStats};
use crate::config::PatternLibraryConfig;
use crate::error::PatternError;
use crate::index::PatternIndex;
use crate::search::{
    apply_feedback, confidence, rank_score, relevance, PatternFeedback, PatternMatch,
    SearchCriteria, SearchKey,
};
use crate::snapshot::{LibrarySnapshot, SnapshotEntry};

/// Partial update applied by [`PatternLibrary::update_pattern`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New example input
    pub input: Option<String>,
    /// New example output
    pub output: Option<String>,
    /// New context
    pub context: Option<String>,
    /// New quality
    pub quality: Option<f64>,
    /// New category
    pub category: Option<String>,
    /// New domain
    pub domain: Option<String>,
    /// New complexity
    pub complexity: Option<f64>,
    /// New recency
    pub recency: Option<f64>,
}

impl PatternUpdate {
    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With quality
    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn apply(self, pattern: &mut ExamplePattern) {
        let Self {
            name,
            description,
            input,
            output,
            context,
            quality,
            category,
            domain,
            complexity,
            recency,
        } = self;
        if let Some(v) = name {
            pattern.name = v;
        }
        if let Some(v) = description {
            pattern.description = v;
        }
        if let Some(v) = input {
            pattern.input = v;
        }
        if let Some(v) = output {
            pattern.output = v;
        }
        if let Some(v) = context {
            pattern.context = v;
        }
        if let Some(v) = quality {
            pattern.quality = v;
        }
        if let Some(v) = category {
            pattern.metadata.category = v;
        }
        if let Some(v) = domain {
            pattern.metadata.domain = v;
        }
        if let Some(v) = complexity {
            pattern.metadata.complexity = v;
        }
        if let Some(v) = recency {
            pattern.metadata.recency = v;
        }
    }
}

#[derive(Debug, Default)]
struct PatternStore {
    patterns: HashMap<String, ExamplePattern>,
    index: PatternIndex,
}

impl PatternStore {
    fn insert(&mut self, pattern: ExamplePattern) {
        self.index.insert(&pattern);
        self.patterns.insert(pattern.id.clone(), pattern);
    }

    fn remove(&mut self, id: &str) -> Option<ExamplePattern> {
        let pattern = self.patterns.remove(id)?;
        self.index.remove(&pattern);
        Some(pattern)
    }

    /// Stored pattern whose description overlaps `description` above `threshold`
    fn near_duplicate(
        &self,
        description: &str,
        threshold: f64,
        skip_id: Option<&str>,
    ) -> Option<(String, f64)> {
        self.patterns
            .values()
            .filter(|p| Some(p.id.as_str()) != skip_id)
            .map(|p| (p.id.clone(), token_overlap(description, &p.description)))
            .find(|(_, similarity)| *similarity > threshold)
    }
}

/// Indexed store of example patterns with cached similarity search
///
/// # Example
///
/// ```rust
/// use forge_artifact::ExamplePattern;
/// use forge_patterns::PatternLibrary;
///
/// let library = PatternLibrary::default();
/// library
///     .add_pattern(ExamplePattern::new("rest", "REST", "RESTful API endpoint design", "web"))
///     .unwrap();
/// assert_eq!(library.len(), 1);
/// ```
#[derive(Debug)]
pub struct PatternLibrary {
    config: PatternLibraryConfig,
    store: RwLock<PatternStore>,
    evolution: DashMap<String, PatternEvolution>,
    cache: SearchCache,
    generation: AtomicU64,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new(PatternLibraryConfig::default())
    }
}

impl PatternLibrary {
    /// Create empty library
    #[must_use]
    pub fn new(config: PatternLibraryConfig) -> Self {
        let cache = SearchCache::with_ttl(config.cache_capacity, config.cache_ttl);
        Self {
            config,
            store: RwLock::new(PatternStore::default()),
            evolution: DashMap::new(),
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Create library pre-loaded with patterns
    ///
    /// # Errors
    /// Returns the first rejection from [`Self::add_pattern`]
    pub fn with_patterns(
        config: PatternLibraryConfig,
        patterns: impl IntoIterator<Item = ExamplePattern>,
    ) -> Result<Self, PatternError> {
        let library = Self::new(config);
        for pattern in patterns {
            library.add_pattern(pattern)?;
        }
        Ok(library)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PatternLibraryConfig {
        &self.config
    }

    /// Store a new pattern
    ///
    /// When the library is full and auto cleanup is on, stale low-usage
    /// patterns are evicted first.
    ///
    /// # Errors
    /// - [`PatternError::MissingField`] / [`PatternError::OutOfRange`] on invalid fields
    /// - [`PatternError::DuplicateId`] if the id is taken
    /// - [`PatternError::DuplicateDescription`] if a stored description is too close
    /// - [`PatternError::CapacityExceeded`] if the library is full
    pub fn add_pattern(&self, pattern: ExamplePattern) -> Result<(), PatternError> {
        validate_pattern(&pattern)?;

        let mut store = self.store.write();

        if store.patterns.contains_key(&pattern.id) {
            return Err(PatternError::DuplicateId(pattern.id));
        }
        if let Some((existing, similarity)) =
            store.near_duplicate(&pattern.description, self.config.duplicate_threshold, None)
        {
            debug!(id = %pattern.id, %existing, similarity, "Rejected near-duplicate pattern");
            return Err(PatternError::DuplicateDescription { existing, similarity });
        }

        if store.patterns.len() >= self.config.max_patterns {
            if self.config.auto_cleanup {
                let evicted = self.evict_stale(&mut store);
                if evicted > 0 {
                    self.bump_generation();
                }
            }
            if store.patterns.len() >= self.config.max_patterns {
                warn!(id = %pattern.id, max = self.config.max_patterns, "Pattern library full");
                return Err(PatternError::CapacityExceeded {
                    max: self.config.max_patterns,
                });
            }
        }

        let mut evolution = PatternEvolution::new(Utc::now());
        evolution.usage_count = pattern.metadata.usage_count;
        self.evolution.insert(pattern.id.clone(), evolution);

        info!(
            id = %pattern.id,
            domain = %pattern.metadata.domain,
            category = %pattern.metadata.category,
            "Added pattern"
        );
        store.insert(pattern);
        metrics::gauge!("forge_patterns_stored").set(store.patterns.len() as f64);
        self.bump_generation();
        Ok(())
    }

    /// Apply a partial update to a stored pattern
    ///
    /// # Errors
    /// - [`PatternError::NotFound`] for an unknown id
    /// - field and duplicate errors as for [`Self::add_pattern`]
    pub fn update_pattern(
        &self,
        id: &str,
        update: PatternUpdate,
    ) -> Result<ExamplePattern, PatternError> {
        let mut store = self.store.write();
        let current = store
            .patterns
            .get(id)
            .cloned()
            .ok_or_else(|| PatternError::not_found(id))?;

        let mut updated = current.clone();
        update.apply(&mut updated);
        validate_pattern(&updated)?;

        if updated.description != current.description {
            if let Some((existing, similarity)) = store.near_duplicate(
                &updated.description,
                self.config.duplicate_threshold,
                Some(id),
            ) {
                return Err(PatternError::DuplicateDescription { existing, similarity });
            }
        }

        store.remove(id);
        store.insert(updated.clone());
        self.bump_generation();
        debug!(%id, "Updated pattern");
        Ok(updated)
    }

    /// Remove a pattern and its learning record
    ///
    /// # Errors
    /// Returns [`PatternError::NotFound`] for an unknown id
    pub fn remove_pattern(&self, id: &str) -> Result<ExamplePattern, PatternError> {
        let mut store = self.store.write();
        let pattern = store.remove(id).ok_or_else(|| PatternError::not_found(id))?;
        self.evolution.remove(id);
        metrics::gauge!("forge_patterns_stored").set(store.patterns.len() as f64);
        self.bump_generation();
        info!(%id, "Removed pattern");
        Ok(pattern)
    }

    /// Stored pattern, with `usage_count` taken from its learning record
    #[must_use]
    pub fn get_pattern(&self, id: &str) -> Option<ExamplePattern> {
        let store = self.store.read();
        store.patterns.get(id).map(|p| self.materialize(p))
    }

    /// Learning record of a pattern
    #[must_use]
    pub fn evolution(&self, id: &str) -> Option<PatternEvolution> {
        self.evolution.get(id).map(|e| e.value().clone())
    }

    /// All stored patterns, sorted by id
    #[must_use]
    pub fn patterns(&self) -> Vec<ExamplePattern> {
        let store = self.store.read();
        let mut patterns: Vec<_> = store.patterns.values().map(|p| self.materialize(p)).collect();
        patterns.sort_by(|a, b| a.id.cmp(&b.id));
        patterns
    }

    /// Number of stored patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().patterns.len()
    }

    /// Whether the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().patterns.is_empty()
    }

    /// Structural version; changes on every add/update/remove/eviction/import
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Ranked patterns similar to `query`
    ///
    /// Results are cached per query and criteria until the next structural
    /// mutation or TTL expiry. Concurrent identical searches share one
    /// computation. Only the call that computed a result updates usage
    /// records, so cached hits never inflate usage counts.
    pub async fn find_similar(&self, query: &str, criteria: &SearchCriteria) -> Vec<PatternMatch> {
        if criteria.max_examples == 0 {
            return Vec::new();
        }

        let key = SearchKey::new(self.generation(), query, criteria);
        let lookup = self
            .cache
            .get_or_compute(key, async { self.rank(query, criteria) })
            .await;

        if lookup.fresh {
            metrics::counter!("forge_pattern_search_misses_total").increment(1);
            if self.config.enable_learning {
                self.record_usage(&lookup.matches);
            }
        } else {
            metrics::counter!("forge_pattern_search_hits_total").increment(1);
        }

        debug!(
            query_len = query.len(),
            matches = lookup.matches.len(),
            cached = !lookup.fresh,
            "Pattern search"
        );
        lookup.matches.as_ref().clone()
    }

    /// Fold an outcome into a pattern's learning record
    ///
    /// # Errors
    /// Returns [`PatternError::NotFound`] for an unknown id, whether or not
    /// learning is enabled
    pub fn record_feedback(&self, id: &str, feedback: PatternFeedback) -> Result<(), PatternError> {
        let mut record = self
            .evolution
            .get_mut(id)
            .ok_or_else(|| PatternError::not_found(id))?;
        if !self.config.enable_learning {
            return Ok(());
        }
        apply_feedback(record.value_mut(), feedback);
        debug!(%id, success = feedback.success, "Recorded pattern feedback");
        Ok(())
    }

    /// Evict stale, rarely used patterns now
    ///
    /// Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let mut store = self.store.write();
        let evicted = self.evict_stale(&mut store);
        if evicted > 0 {
            metrics::gauge!("forge_patterns_stored").set(store.patterns.len() as f64);
            self.bump_generation();
        }
        evicted
    }

    /// Library-wide statistics
    #[must_use]
    pub fn analytics(&self) -> LibraryAnalytics {
        let store = self.store.read();
        LibraryAnalytics::compute(
            store
                .patterns
                .values()
                .map(|p| (p, self.evolution.get(&p.id).map(|e| e.value().clone()))),
        )
    }

    /// Export patterns and learning records
    #[must_use]
    pub fn export_snapshot(&self) -> LibrarySnapshot {
        let store = self.store.read();
        let mut entries: Vec<SnapshotEntry> = store
            .patterns
            .values()
            .map(|p| SnapshotEntry {
                pattern: p.clone(),
                evolution: self.evolution.get(&p.id).map(|e| e.value().clone()),
            })
            .collect();
        entries.sort_by(|a, b| a.pattern.id.cmp(&b.pattern.id));
        LibrarySnapshot::new(entries)
    }

    /// Replace the library contents with a snapshot
    ///
    /// The snapshot is validated as a whole before anything changes.
    ///
    /// # Errors
    /// Returns [`PatternError::InvalidSnapshot`] if the snapshot exceeds
    /// capacity, repeats an id, or holds an invalid pattern
    pub fn import_snapshot(&self, snapshot: LibrarySnapshot) -> Result<usize, PatternError> {
        if snapshot.len() > self.config.max_patterns {
            return Err(PatternError::InvalidSnapshot(format!(
                "{} patterns exceed capacity {}",
                snapshot.len(),
                self.config.max_patterns
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &snapshot.entries {
            validate_pattern(&entry.pattern)
                .map_err(|e| PatternError::InvalidSnapshot(format!("{}: {e}", entry.pattern.id)))?;
            if !seen.insert(entry.pattern.id.as_str()) {
                return Err(PatternError::InvalidSnapshot(format!(
                    "duplicate id {}",
                    entry.pattern.id
                )));
            }
        }

        let mut store = self.store.write();
        store.patterns.clear();
        store.index.clear();
        self.evolution.clear();

        let now = Utc::now();
        let count = snapshot.len();
        for SnapshotEntry { pattern, evolution } in snapshot.entries {
            let evolution = evolution.unwrap_or_else(|| {
                let mut fresh = PatternEvolution::new(now);
                fresh.usage_count = pattern.metadata.usage_count;
                fresh
            });
            self.evolution.insert(pattern.id.clone(), evolution);
            store.insert(pattern);
        }
        metrics::gauge!("forge_patterns_stored").set(store.patterns.len() as f64);
        self.bump_generation();
        info!(count, "Imported pattern snapshot");
        Ok(count)
    }

    /// Result cache statistics
    pub async fn cache_stats(&self) -> SearchCacheStats {
        self.cache.stats().await
    }

    fn rank(&self, query: &str, criteria: &SearchCriteria) -> Vec<PatternMatch> {
        let store = self.store.read();
        let query_words = word_set(query);
        if query_words.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&ExamplePattern> = match store.index.candidates(criteria) {
            Some(ids) => ids.iter().filter_map(|id| store.patterns.get(id)).collect(),
            None => store.patterns.values().collect(),
        };

        let mut matches: Vec<PatternMatch> = candidates
            .into_iter()
            .filter_map(|pattern| {
                let similarity = overlap_of_sets(&query_words, &word_set(&pattern.description));
                if similarity < criteria.min_similarity || similarity == 0.0 {
                    return None;
                }
                let evolution = self.evolution.get(&pattern.id).map(|e| e.value().clone());
                let usage = evolution
                    .as_ref()
                    .map_or(pattern.metadata.usage_count, |e| e.usage_count);
                let relevance = relevance(
                    pattern,
                    usage,
                    criteria.complexity,
                    self.config.usage_saturation,
                );
                let confidence = confidence(pattern, evolution.as_ref());
                let mut pattern = pattern.clone();
                pattern.metadata.usage_count = usage;
                Some(PatternMatch {
                    pattern,
                    similarity,
                    relevance,
                    confidence,
                    score: rank_score(similarity, relevance),
                })
            })
            .collect();

        matches.sort_by(PatternMatch::rank_order);
        matches.truncate(criteria.max_examples);
        matches
    }

    fn record_usage(&self, matches: &[PatternMatch]) {
        let now = Utc::now();
        for m in matches {
            if let Some(mut record) = self.evolution.get_mut(&m.pattern.id) {
                record.usage_count += 1;
                record.last_used = now;
            }
        }
    }

    /// Remove patterns unused for `stale_after_days` and used fewer than
    /// `min_usage_to_keep` times. Caller holds the write lock.
    fn evict_stale(&self, store: &mut PatternStore) -> usize {
        let cutoff = Utc::now() - ChronoDuration::days(self.config.stale_after_days);
        let stale: Vec<String> = store
            .patterns
            .keys()
            .filter(|id| {
                self.evolution.get(*id).map_or(true, |e| {
                    e.last_used < cutoff && e.usage_count < self.config.min_usage_to_keep
                })
            })
            .cloned()
            .collect();

        for id in &stale {
            store.remove(id);
            self.evolution.remove(id);
        }
        if !stale.is_empty() {
            info!(evicted = stale.len(), "Evicted stale patterns");
            metrics::counter!("forge_patterns_evicted_total").increment(stale.len() as u64);
        }
        stale.len()
    }

    fn materialize(&self, pattern: &ExamplePattern) -> ExamplePattern {
        let mut pattern = pattern.clone();
        if let Some(record) = self.evolution.get(&pattern.id) {
            pattern.metadata.usage_count = record.usage_count;
        }
        pattern
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }
}

fn validate_pattern(pattern: &ExamplePattern) -> Result<(), PatternError> {
    for (field, value) in [
        ("id", &pattern.id),
        ("name", &pattern.name),
        ("description", &pattern.description),
        ("metadata.domain", &pattern.metadata.domain),
    ] {
        if value.trim().is_empty() {
            return Err(PatternError::MissingField { field });
        }
    }
    for (field, value) in [
        ("quality", pattern.quality),
        ("metadata.complexity", pattern.metadata.complexity),
        ("metadata.recency", pattern.metadata.recency),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange { field, value });
        }
    }
    Ok(())
}
