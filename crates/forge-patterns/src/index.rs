//! Secondary indices over stored patterns
//!
//! Three maps narrow a search before any similarity is computed: category,
//! domain and complexity band. Keys are lowercased. The index is not
//! synchronized on its own; [`crate::PatternLibrary`] keeps it under the
//! same lock as the pattern store so both always agree.

use forge_artifact::ExamplePattern;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::search::SearchCriteria;

/// Coarse complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityBand {
    /// `[0, 0.34)`
    Low,
    /// `[0.34, 0.67)`
    Medium,
    /// `[0.67, 1]`
    High,
}

impl ComplexityBand {
    /// Bucket for a complexity in `[0, 1]`
    #[must_use]
    pub fn of(complexity: f64) -> Self {
        if complexity < 0.34 {
            Self::Low
        } else if complexity < 0.67 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for ComplexityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Category, domain and complexity indices
#[derive(Debug, Default, Clone)]
pub struct PatternIndex {
    by_category: HashMap<String, BTreeSet<String>>,
    by_domain: HashMap<String, BTreeSet<String>>,
    by_complexity: HashMap<ComplexityBand, BTreeSet<String>>,
}

impl PatternIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a pattern under all three keys
    pub fn insert(&mut self, pattern: &ExamplePattern) {
        self.by_category
            .entry(normalize(&pattern.metadata.category))
            .or_default()
            .insert(pattern.id.clone());
        self.by_domain
            .entry(normalize(&pattern.metadata.domain))
            .or_default()
            .insert(pattern.id.clone());
        self.by_complexity
            .entry(ComplexityBand::of(pattern.metadata.complexity))
            .or_default()
            .insert(pattern.id.clone());
    }

    /// Drop a pattern from all three keys
    pub fn remove(&mut self, pattern: &ExamplePattern) {
        remove_from(&mut self.by_category, &normalize(&pattern.metadata.category), &pattern.id);
        remove_from(&mut self.by_domain, &normalize(&pattern.metadata.domain), &pattern.id);
        remove_from(
            &mut self.by_complexity,
            &ComplexityBand::of(pattern.metadata.complexity),
            &pattern.id,
        );
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.by_category.clear();
        self.by_domain.clear();
        self.by_complexity.clear();
    }

    /// Ids passing every filter the criteria set
    ///
    /// Returns `None` when the criteria set no filter, meaning every stored
    /// pattern is a candidate.
    #[must_use]
    pub fn candidates(&self, criteria: &SearchCriteria) -> Option<BTreeSet<String>> {
        let mut filters: Vec<BTreeSet<String>> = Vec::new();

        if let Some(category) = &criteria.category {
            filters.push(self.by_category.get(&normalize(category)).cloned().unwrap_or_default());
        }
        if let Some(domain) = &criteria.domain {
            filters.push(self.by_domain.get(&normalize(domain)).cloned().unwrap_or_default());
        }
        if let Some(complexity) = criteria.complexity {
            filters.push(
                self.by_complexity
                    .get(&ComplexityBand::of(complexity))
                    .cloned()
                    .unwrap_or_default(),
            );
        }

        filters
            .into_iter()
            .reduce(|acc, next| acc.intersection(&next).cloned().collect())
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn remove_from<K>(map: &mut HashMap<K, BTreeSet<String>>, key: &K, id: &str)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = map.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: &str, category: &str, domain: &str, complexity: f64) -> ExamplePattern {
        ExamplePattern::new(id, id, format!("pattern {id}"), domain)
            .with_category(category)
            .with_complexity(complexity)
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(ComplexityBand::of(0.0), ComplexityBand::Low);
        assert_eq!(ComplexityBand::of(0.339), ComplexityBand::Low);
        assert_eq!(ComplexityBand::of(0.34), ComplexityBand::Medium);
        assert_eq!(ComplexityBand::of(0.67), ComplexityBand::High);
    }

    #[test]
    fn no_filters_means_all() {
        let mut index = PatternIndex::new();
        index.insert(&pattern("a", "api", "web", 0.5));
        assert!(index.candidates(&SearchCriteria::default()).is_none());
    }

    #[test]
    fn filters_intersect() {
        let mut index = PatternIndex::new();
        index.insert(&pattern("a", "api", "web", 0.5));
        index.insert(&pattern("b", "api", "data", 0.5));
        index.insert(&pattern("c", "ui", "web", 0.9));

        let criteria = SearchCriteria::default().with_category("API").with_domain("web");
        let ids = index.candidates(&criteria).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a".to_string()]);

        let criteria = SearchCriteria::default().with_complexity(0.8);
        let ids = index.candidates(&criteria).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["c".to_string()]);
    }

    #[test]
    fn remove_clears_empty_keys() {
        let mut index = PatternIndex::new();
        let p = pattern("a", "api", "web", 0.5);
        index.insert(&p);
        index.remove(&p);
        assert!(index.by_category.is_empty());
        assert!(index.by_domain.is_empty());
        let criteria = SearchCriteria::default().with_domain("web");
        assert!(index.candidates(&criteria).unwrap().is_empty());
    }
}
