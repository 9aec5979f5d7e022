//! Search criteria, ranked matches and the scoring model
//!
//! ```text
//! similarity = |Q ∩ D| / max(|Q|, |D|)
//! relevance  = 0.3·quality + 0.3·usage + 0.2·recency + 0.2·complexity match
//! confidence = 0.5·quality + 0.5·historical
//! score      = 0.6·similarity + 0.4·relevance
//! ```

use forge_artifact::{ExamplePattern, PatternEvolution};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default number of matches returned
pub const DEFAULT_MAX_EXAMPLES: usize = 5;

/// Default similarity floor
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// Filters and limits for a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Only patterns in this category
    pub category: Option<String>,
    /// Only patterns in this domain
    pub domain: Option<String>,
    /// Target complexity in `[0, 1]`; filters by band and feeds relevance
    pub complexity: Option<f64>,
    /// Result cap
    pub max_examples: usize,
    /// Similarity floor
    pub min_similarity: f64,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            category: None,
            domain: None,
            complexity: None,
            max_examples: DEFAULT_MAX_EXAMPLES,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl SearchCriteria {
    /// With category filter
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// With domain filter
    #[inline]
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// With target complexity
    #[inline]
    #[must_use]
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// With result cap
    #[inline]
    #[must_use]
    pub fn with_max_examples(mut self, max: usize) -> Self {
        self.max_examples = max;
        self
    }

    /// With similarity floor
    #[inline]
    #[must_use]
    pub fn with_min_similarity(mut self, min: f64) -> Self {
        self.min_similarity = min;
        self
    }
}

/// A pattern returned by a search with its scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    /// Matched pattern; `metadata.usage_count` reflects its usage record
    pub pattern: ExamplePattern,
    /// Token overlap with the query
    pub similarity: f64,
    /// Weighted quality/usage/recency/complexity signal
    pub relevance: f64,
    /// Quality blended with feedback history
    pub confidence: f64,
    /// Ranking key
    pub score: f64,
}

impl PatternMatch {
    /// Ordering: score descending, then id ascending
    pub(crate) fn rank_order(a: &Self, b: &Self) -> Ordering {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pattern.id.cmp(&b.pattern.id))
    }
}

/// Outcome of applying a pattern, fed back into its learning record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFeedback {
    /// Whether the use succeeded
    pub success: bool,
    /// Rating in `[0, 1]`
    pub score: f64,
    /// Whether the pattern was adapted into an artifact
    pub adapted: bool,
}

impl PatternFeedback {
    /// Successful use with a rating
    #[must_use]
    pub fn success(score: f64) -> Self {
        Self { success: true, score, adapted: true }
    }

    /// Failed use with a rating
    #[must_use]
    pub fn failure(score: f64) -> Self {
        Self { success: false, score, adapted: false }
    }
}

/// Feedback smoothing factor
const FEEDBACK_ALPHA: f64 = 0.3;

/// Fold one feedback event into a learning record
pub(crate) fn apply_feedback(evolution: &mut PatternEvolution, feedback: PatternFeedback) {
    let n = evolution.feedback_count as f64;
    let outcome = if feedback.success { 1.0 } else { 0.0 };
    evolution.success_rate = ((evolution.success_rate * n + outcome) / (n + 1.0)).clamp(0.0, 1.0);
    evolution.feedback_score = ((1.0 - FEEDBACK_ALPHA) * evolution.feedback_score
        + FEEDBACK_ALPHA * feedback.score.clamp(0.0, 1.0))
    .clamp(0.0, 1.0);
    evolution.feedback_count += 1;
    if feedback.adapted {
        evolution.adaptations += 1;
    }
}

/// Relevance in `[0, 1]`
#[must_use]
pub fn relevance(
    pattern: &ExamplePattern,
    usage_count: u64,
    target_complexity: Option<f64>,
    usage_saturation: u64,
) -> f64 {
    let usage = if usage_saturation == 0 {
        1.0
    } else {
        (usage_count as f64 / usage_saturation as f64).min(1.0)
    };
    let complexity_match = target_complexity
        .map_or(1.0, |target| 1.0 - (pattern.metadata.complexity - target).abs());

    (0.3 * pattern.quality
        + 0.3 * usage
        + 0.2 * pattern.metadata.recency
        + 0.2 * complexity_match)
        .clamp(0.0, 1.0)
}

/// Confidence in `[0, 1]`
#[must_use]
pub fn confidence(pattern: &ExamplePattern, evolution: Option<&PatternEvolution>) -> f64 {
    let historical = evolution.map_or(0.5, PatternEvolution::historical_signal);
    (0.5 * pattern.quality + 0.5 * historical).clamp(0.0, 1.0)
}

/// Ranking key
#[inline]
#[must_use]
pub fn rank_score(similarity: f64, relevance: f64) -> f64 {
    0.6 * similarity + 0.4 * relevance
}

/// Result cache key: every input of a search plus the library generation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SearchKey {
    generation: u64,
    query: String,
    category: Option<String>,
    domain: Option<String>,
    complexity_bits: Option<u64>,
    max_examples: usize,
    min_similarity_bits: u64,
}

impl SearchKey {
    pub(crate) fn new(generation: u64, query: &str, criteria: &SearchCriteria) -> Self {
        Self {
            generation,
            query: query.trim().to_lowercase(),
            category: criteria.category.as_deref().map(str::to_lowercase),
            domain: criteria.domain.as_deref().map(str::to_lowercase),
            complexity_bits: criteria.complexity.map(f64::to_bits),
            max_examples: criteria.max_examples,
            min_similarity_bits: criteria.min_similarity.to_bits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn relevance_weights() {
        let p = ExamplePattern::new("p", "P", "d", "web")
            .with_quality(1.0)
            .with_recency(1.0)
            .with_complexity(0.5);
        assert!((relevance(&p, 10, Some(0.5), 10) - 1.0).abs() < 1e-9);
        assert!((relevance(&p, 0, Some(0.5), 10) - 0.7).abs() < 1e-9);
        assert!((relevance(&p, 0, Some(1.0), 10) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn confidence_defaults_to_neutral_history() {
        let p = ExamplePattern::new("p", "P", "d", "web").with_quality(0.9);
        assert!((confidence(&p, None) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn feedback_moves_success_rate() {
        let mut evo = PatternEvolution::new(Utc::now());
        apply_feedback(&mut evo, PatternFeedback::success(1.0));
        assert!((evo.success_rate - 1.0).abs() < 1e-9);
        assert!((evo.feedback_score - 0.65).abs() < 1e-9);
        assert_eq!(evo.adaptations, 1);

        apply_feedback(&mut evo, PatternFeedback::failure(0.0));
        assert!((evo.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(evo.feedback_count, 2);
    }

    #[test]
    fn key_ignores_query_case() {
        let c = SearchCriteria::default();
        assert_eq!(SearchKey::new(1, "REST api", &c), SearchKey::new(1, " rest API ", &c));
        assert_ne!(SearchKey::new(1, "rest", &c), SearchKey::new(2, "rest", &c));
    }

    proptest! {
        #[test]
        fn scores_stay_in_unit_range(
            quality in 0.0f64..=1.0,
            recency in 0.0f64..=1.0,
            complexity in 0.0f64..=1.0,
            target in proptest::option::of(0.0f64..=1.0),
            usage in 0u64..100,
            similarity in 0.0f64..=1.0,
        ) {
            let p = ExamplePattern::new("p", "P", "d", "web")
                .with_quality(quality)
                .with_recency(recency)
                .with_complexity(complexity);
            let r = relevance(&p, usage, target, 10);
            let c = confidence(&p, None);
            prop_assert!((0.0..=1.0).contains(&r));
            prop_assert!((0.0..=1.0).contains(&c));
            prop_assert!((0.0..=1.0).contains(&rank_score(similarity, r)));
        }
    }
}
