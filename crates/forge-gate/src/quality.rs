//! Quality heuristics
//!
//! Four category scores in `[0, 1]` compared against configured thresholds.
//! Scoring sits behind [`QualityScorer`]; [`HeuristicQualityScorer`] is the
//! lexical default built on a [`TextScorer`].

use forge_artifact::text::{is_action_verb, tokenize};
use forge_artifact::{
    CanonicalSection, HeuristicTextScorer, PhaseArtifact, TextProfile, TextScorer,
    ValidationIssue,
};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::QualityThresholds;
use crate::report::ValidatorReport;

/// Category name used for the aggregate quality score
pub const QUALITY: &str = "quality";

/// Words that make a criterion checkable
const MEASURABLE_WORDS: &[&str] = &[
    "verify", "verified", "test", "tests", "tested", "measure", "measured", "must", "within",
    "percent", "returns", "return", "pass", "passes", "fail", "fails", "least", "most", "exactly",
    "equal", "equals", "coverage", "latency", "status", "under", "below", "above", "ms",
];

/// Sections that count toward completeness coverage
const COVERAGE_SECTIONS: [CanonicalSection; 4] = [
    CanonicalSection::Objective,
    CanonicalSection::SuccessCriteria,
    CanonicalSection::ContextRequirements,
    CanonicalSection::ValidationCheckpoints,
];

/// Per-category quality scores in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    /// Readability
    pub clarity: f64,
    /// Coverage and length
    pub completeness: f64,
    /// Action-verb share
    pub actionability: f64,
    /// Measurable-criteria share
    pub testability: f64,
}

impl QualityScores {
    /// `(name, score)` pairs in reporting order
    #[must_use]
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("clarity", self.clarity),
            ("completeness", self.completeness),
            ("actionability", self.actionability),
            ("testability", self.testability),
        ]
    }

    /// Arithmetic mean of the four categories
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.entries().iter().map(|(_, s)| s).sum::<f64>() / 4.0
    }
}

/// Scoring strategy for the quality categories
pub trait QualityScorer: Send + Sync + Debug {
    /// Score every category; each in `[0, 1]`
    fn score(&self, artifact: &PhaseArtifact) -> QualityScores;
}

/// Lexical quality scorer
#[derive(Debug, Clone)]
pub struct HeuristicQualityScorer {
    text: Arc<dyn TextScorer>,
}

impl Default for HeuristicQualityScorer {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicTextScorer))
    }
}

impl HeuristicQualityScorer {
    /// Build on a text scorer
    #[must_use]
    pub fn new(text: Arc<dyn TextScorer>) -> Self {
        Self { text }
    }

    fn clarity(&self, artifact: &PhaseArtifact) -> f64 {
        let mut text = artifact.description.clone();
        if let Some(objective) = &artifact.objective {
            text.push('\n');
            text.push_str(objective);
        }
        self.text.clarity(&TextProfile::analyze(&text))
    }

    fn completeness(&self, artifact: &PhaseArtifact) -> f64 {
        let present = COVERAGE_SECTIONS
            .iter()
            .filter(|s| artifact.has_section(**s))
            .count();
        let coverage = present as f64 / COVERAGE_SECTIONS.len() as f64;
        let length = self.text.completeness(&TextProfile::analyze(&artifact.prose()));
        0.6 * coverage + 0.4 * length
    }

    fn actionability(&self, artifact: &PhaseArtifact) -> f64 {
        let items = actionable_items(artifact);
        if items.is_empty() {
            return self
                .text
                .actionability(&TextProfile::analyze(&artifact.description));
        }
        let actionable = items
            .iter()
            .filter(|item| tokenize(item).iter().any(|w| is_action_verb(w)))
            .count();
        actionable as f64 / items.len() as f64
    }

    fn testability(artifact: &PhaseArtifact) -> f64 {
        let items: Vec<&str> = [&artifact.success_criteria, &artifact.validation_checkpoints]
            .into_iter()
            .flatten()
            .flatten()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .collect();
        if items.is_empty() {
            return 0.0;
        }
        let measurable = items.iter().filter(|item| is_measurable(item)).count();
        measurable as f64 / items.len() as f64
    }
}

impl QualityScorer for HeuristicQualityScorer {
    fn score(&self, artifact: &PhaseArtifact) -> QualityScores {
        QualityScores {
            clarity: self.clarity(artifact).clamp(0.0, 1.0),
            completeness: self.completeness(artifact).clamp(0.0, 1.0),
            actionability: self.actionability(artifact).clamp(0.0, 1.0),
            testability: Self::testability(artifact).clamp(0.0, 1.0),
        }
    }
}

fn actionable_items(artifact: &PhaseArtifact) -> Vec<&str> {
    let mut items: Vec<&str> = artifact.objective.iter().map(String::as_str).collect();
    for list in [
        &artifact.success_criteria,
        &artifact.context_requirements,
        &artifact.validation_checkpoints,
    ]
    .into_iter()
    .flatten()
    {
        items.extend(list.iter().map(String::as_str));
    }
    items.retain(|s| !s.trim().is_empty());
    items
}

fn is_measurable(item: &str) -> bool {
    item.chars().any(|c| c.is_ascii_digit())
        || item.contains('%')
        || tokenize(item)
            .iter()
            .any(|w| MEASURABLE_WORDS.contains(&w.as_str()))
}

/// Compares quality scores against thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityValidator;

impl QualityValidator {
    /// Report with score `mean × 100` and one warning per category below threshold
    #[must_use]
    pub fn validate(scores: &QualityScores, thresholds: &QualityThresholds) -> ValidatorReport {
        let mut report = ValidatorReport::new(scores.mean() * 100.0);
        for ((category, score), (_, threshold)) in
            scores.entries().into_iter().zip(thresholds.entries())
        {
            if score < threshold {
                report.issues.push(ValidationIssue::warning(
                    format!("low-{category}"),
                    category,
                    shortfall_severity(score, threshold),
                    format!("{category} score {score:.2} is below threshold {threshold:.2}"),
                    suggestion(category),
                ));
            }
        }
        report
    }
}

/// 3 for a marginal miss up to 6 for a score of 0
fn shortfall_severity(score: f64, threshold: f64) -> u8 {
    if threshold <= 0.0 {
        return 3;
    }
    let shortfall = ((threshold - score) / threshold).clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let extra = (shortfall * 3.0).round() as u8;
    3 + extra
}

fn suggestion(category: &str) -> &'static str {
    match category {
        "clarity" => "Use shorter sentences of roughly 8 to 20 words",
        "completeness" => "Fill in every section and expand the description",
        "actionability" => "Start items with concrete verbs such as implement, add or verify",
        _ => "Make criteria measurable with numbers, limits or explicit checks",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn testability_is_zero_without_criteria() {
        let artifact = PhaseArtifact::new("a", "A", "Build a thing.");
        let scores = HeuristicQualityScorer::default().score(&artifact);
        assert_eq!(scores.testability, 0.0);
    }

    #[test]
    fn measurable_items_raise_testability() {
        let artifact = PhaseArtifact::new("a", "A", "Build a thing.")
            .with_success_criteria(["Responds within 200 ms", "Looks nice"]);
        let scores = HeuristicQualityScorer::default().score(&artifact);
        assert!((scores.testability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn actionability_counts_items_with_verbs() {
        let artifact = PhaseArtifact::new("a", "A", "Text.")
            .with_objective("Implement login")
            .with_context_requirements(["session table", "Configure the cache"]);
        let scores = HeuristicQualityScorer::default().score(&artifact);
        assert!((scores.actionability - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_warns_with_bounded_severity() {
        let scores = QualityScores {
            clarity: 0.0,
            completeness: 1.0,
            actionability: 0.85,
            testability: 0.75,
        };
        let report = QualityValidator::validate(&scores, &QualityThresholds::default());
        let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["low-clarity", "low-actionability"]);
        assert_eq!(report.issues[0].severity, 6);
        assert_eq!(report.issues[1].severity, 3);
        assert!((report.score - 65.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn lowering_a_threshold_never_adds_warnings(
            clarity in 0.0f64..=1.0,
            completeness in 0.0f64..=1.0,
            actionability in 0.0f64..=1.0,
            testability in 0.0f64..=1.0,
            high in 0.0f64..=1.0,
            delta in 0.0f64..=1.0,
        ) {
            let scores = QualityScores { clarity, completeness, actionability, testability };
            let low = (high - delta).max(0.0);
            let strict = QualityValidator::validate(&scores, &QualityThresholds::uniform(high));
            let lenient = QualityValidator::validate(&scores, &QualityThresholds::uniform(low));
            for issue in &lenient.issues {
                prop_assert!(strict.issues.iter().any(|i| i.id == issue.id));
            }
            prop_assert_eq!(strict.score, lenient.score);
        }
    }
}
