//! Example patterns and their evolution records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used when a pattern names none
pub const DEFAULT_CATEGORY: &str = "general";

/// A stored exemplar used to enrich artifacts through similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplePattern {
    /// Unique id
    pub id: String,
    /// Short name
    pub name: String,
    /// Description matched against queries
    pub description: String,
    /// Example input
    #[serde(default)]
    pub input: String,
    /// Example output
    #[serde(default)]
    pub output: String,
    /// Where the example applies
    #[serde(default)]
    pub context: String,
    /// Quality in `[0, 1]`
    pub quality: f64,
    /// Classification and usage
    pub metadata: PatternMetadata,
}

impl ExamplePattern {
    /// Create a pattern in `domain` with neutral defaults
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            input: String::new(),
            output: String::new(),
            context: String::new(),
            quality: 0.5,
            metadata: PatternMetadata {
                domain: domain.into(),
                category: DEFAULT_CATEGORY.to_string(),
                complexity: 0.5,
                recency: 1.0,
                usage_count: 0,
            },
        }
    }

    /// With quality score
    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = category.into();
        self
    }

    /// With complexity in `[0, 1]`
    #[inline]
    #[must_use]
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.metadata.complexity = complexity;
        self
    }

    /// With recency in `[0, 1]`
    #[inline]
    #[must_use]
    pub fn with_recency(mut self, recency: f64) -> Self {
        self.metadata.recency = recency;
        self
    }

    /// With example input/output/context
    #[must_use]
    pub fn with_example(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        self.input = input.into();
        self.output = output.into();
        self.context = context.into();
        self
    }

    /// Whether input, output and context are all filled in
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.input, &self.output, &self.context]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

/// Pattern classification and usage metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMetadata {
    /// Problem domain (required)
    pub domain: String,
    /// Category index key
    #[serde(default = "default_category")]
    pub category: String,
    /// Complexity in `[0, 1]`
    pub complexity: f64,
    /// Recency in `[0, 1]`
    pub recency: f64,
    /// Times returned by a search
    #[serde(default)]
    pub usage_count: u64,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Mutable learning record kept beside each pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEvolution {
    /// Times returned by a non-cached search
    pub usage_count: u64,
    /// Last time the pattern was returned (or added)
    pub last_used: DateTime<Utc>,
    /// Times the pattern was adapted into an artifact
    pub adaptations: u64,
    /// Running share of successful uses
    pub success_rate: f64,
    /// Smoothed feedback score
    pub feedback_score: f64,
    /// Feedback events folded into `success_rate`
    #[serde(default)]
    pub feedback_count: u64,
}

impl PatternEvolution {
    /// Fresh record with a neutral historical signal
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            usage_count: 0,
            last_used: now,
            adaptations: 0,
            success_rate: 0.5,
            feedback_score: 0.5,
            feedback_count: 0,
        }
    }

    /// Combined success/feedback signal in `[0, 1]`
    #[must_use]
    pub fn historical_signal(&self) -> f64 {
        ((self.success_rate + self.feedback_score) / 2.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_metadata() {
        let p = ExamplePattern::new("p1", "REST", "RESTful API endpoint", "web")
            .with_quality(0.9)
            .with_category("api")
            .with_complexity(0.4);
        assert_eq!(p.metadata.domain, "web");
        assert_eq!(p.metadata.category, "api");
        assert!((p.quality - 0.9).abs() < f64::EPSILON);
        assert!(!p.is_complete());
        assert!(p.with_example("GET /x", "200", "http").is_complete());
    }

    #[test]
    fn category_defaults_when_missing() {
        let json = serde_json::json!({
            "id": "p1", "name": "n", "description": "d", "quality": 0.5,
            "metadata": {"domain": "web", "complexity": 0.5, "recency": 1.0}
        });
        let p: ExamplePattern = serde_json::from_value(json).unwrap();
        assert_eq!(p.metadata.category, DEFAULT_CATEGORY);
        assert_eq!(p.metadata.usage_count, 0);
    }

    #[test]
    fn evolution_starts_neutral() {
        let evo = PatternEvolution::new(Utc::now());
        assert!((evo.historical_signal() - 0.5).abs() < f64::EPSILON);
    }
}
