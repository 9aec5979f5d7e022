//! Library-wide statistics

use forge_artifact::{ExamplePattern, PatternEvolution};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of entries in [`LibraryAnalytics::most_used`]
pub const MOST_USED_LIMIT: usize = 10;

/// Quality histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    /// quality >= 0.8
    pub high: usize,
    /// 0.5 <= quality < 0.8
    pub medium: usize,
    /// quality < 0.5
    pub low: usize,
}

/// Usage summary for one pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternUsage {
    /// Pattern id
    pub id: String,
    /// Pattern name
    pub name: String,
    /// Times returned by a non-cached search
    pub usage_count: u64,
}

/// Snapshot statistics over the whole library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAnalytics {
    /// Stored patterns
    pub total_patterns: usize,
    /// Quality histogram
    pub quality_distribution: QualityDistribution,
    /// Mean quality, 0 when empty
    pub average_quality: f64,
    /// Patterns per category
    pub category_coverage: BTreeMap<String, usize>,
    /// Patterns per domain
    pub domain_coverage: BTreeMap<String, usize>,
    /// Top patterns by usage
    pub most_used: Vec<PatternUsage>,
    /// Distinct category/domain spread in `[0, 1]`
    pub diversity_score: f64,
    /// Mean recency
    pub recency_score: f64,
    /// Share of patterns with input, output and context filled in
    pub completeness_score: f64,
}

impl LibraryAnalytics {
    pub(crate) fn compute<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a ExamplePattern, Option<PatternEvolution>)>,
    {
        let mut analytics = Self::default();
        let mut quality_sum = 0.0;
        let mut recency_sum = 0.0;
        let mut complete = 0usize;
        let mut categories = BTreeSet::new();
        let mut domains = BTreeSet::new();

        for (pattern, evolution) in entries {
            analytics.total_patterns += 1;
            quality_sum += pattern.quality;
            recency_sum += pattern.metadata.recency;
            if pattern.is_complete() {
                complete += 1;
            }

            match pattern.quality {
                q if q >= 0.8 => analytics.quality_distribution.high += 1,
                q if q >= 0.5 => analytics.quality_distribution.medium += 1,
                _ => analytics.quality_distribution.low += 1,
            }

            let category = pattern.metadata.category.to_lowercase();
            let domain = pattern.metadata.domain.to_lowercase();
            *analytics.category_coverage.entry(category.clone()).or_default() += 1;
            *analytics.domain_coverage.entry(domain.clone()).or_default() += 1;
            categories.insert(category);
            domains.insert(domain);

            analytics.most_used.push(PatternUsage {
                id: pattern.id.clone(),
                name: pattern.name.clone(),
                usage_count: evolution.map_or(pattern.metadata.usage_count, |e| e.usage_count),
            });
        }

        analytics
            .most_used
            .sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then_with(|| a.id.cmp(&b.id)));
        analytics.most_used.truncate(MOST_USED_LIMIT);

        if analytics.total_patterns > 0 {
            let n = analytics.total_patterns as f64;
            analytics.average_quality = quality_sum / n;
            analytics.recency_score = recency_sum / n;
            analytics.completeness_score = complete as f64 / n;
            analytics.diversity_score =
                ((categories.len() as f64 / n) + (domains.len() as f64 / n)) / 2.0;
        }

        analytics
    }
}
