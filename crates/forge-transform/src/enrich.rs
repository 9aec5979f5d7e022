//! Per-section enrichment
//!
//! Each step returns `None` when its section has nothing to enrich, so an
//! absent result is always explicit.

use forge_artifact::text::{sentences, tokenize};
use forge_artifact::{
    DescriptionAnalysis, ImplementationPlan, ImplementationStep, PrioritizedRequirement,
    Priority, RequirementBreakdown, TextProfile, TextScorer,
};
use once_cell::sync::Lazy;
use regex::Regex;

static STEP_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:after|requires|depends on|needs)\s+(?:the\s+)?([^,.;()]+)")
        .expect("Valid step dependency regex")
});

const NON_FUNCTIONAL_KEYWORDS: &[&str] = &[
    "performance", "latency", "throughput", "ms", "seconds", "percent", "secure", "security",
    "scalable", "scalability", "availability", "available", "reliable", "reliability", "uptime",
    "usability", "accessible", "accessibility", "maintainable", "respond", "responds",
    "concurrent", "load",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "database", "api", "cache", "server", "protocol", "framework", "library", "schema",
    "endpoint", "queue", "storage", "sql", "http", "grpc", "json", "docker", "kubernetes",
    "ledger", "service", "store", "stored",
];

/// Kind bucket of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    /// Behavior
    Functional,
    /// Quality attribute
    NonFunctional,
    /// Technology or interface constraint
    Technical,
}

/// Bucket a requirement by keyword; non-functional wins over technical
#[must_use]
pub fn classify_requirement(text: &str) -> RequirementKind {
    let words = tokenize(text);
    let has = |keywords: &[&str]| words.iter().any(|w| keywords.contains(&w.as_str()));
    if text.contains('%') || has(NON_FUNCTIONAL_KEYWORDS) {
        RequirementKind::NonFunctional
    } else if has(TECHNICAL_KEYWORDS) {
        RequirementKind::Technical
    } else {
        RequirementKind::Functional
    }
}

/// Position-derived priority
#[must_use]
pub fn priority_for(position: usize, high: usize, medium: usize) -> Priority {
    if position < high {
        Priority::High
    } else if position < high + medium {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Score a description
#[must_use]
pub fn analyze_description(text: &str, scorer: &dyn TextScorer) -> Option<DescriptionAnalysis> {
    if text.trim().is_empty() {
        return None;
    }
    let profile = TextProfile::analyze(text);
    Some(DescriptionAnalysis {
        clarity: scorer.clarity(&profile),
        completeness: scorer.completeness(&profile),
        actionability: scorer.actionability(&profile),
        word_count: profile.word_count,
        sentence_count: sentences(text).len(),
    })
}

/// Bucket and prioritize requirement items
#[must_use]
pub fn break_down_requirements(
    items: &[String],
    high: usize,
    medium: usize,
) -> Option<RequirementBreakdown> {
    let mut breakdown = RequirementBreakdown::default();
    for (position, text) in items.iter().filter(|t| !t.trim().is_empty()).enumerate() {
        let requirement = PrioritizedRequirement {
            text: text.trim().to_string(),
            priority: priority_for(position, high, medium),
            position,
        };
        match classify_requirement(text) {
            RequirementKind::Functional => breakdown.functional.push(requirement),
            RequirementKind::NonFunctional => breakdown.non_functional.push(requirement),
            RequirementKind::Technical => breakdown.technical.push(requirement),
        }
    }
    (!breakdown.is_empty()).then_some(breakdown)
}

/// Naive estimate: 15 minutes plus 3 per word, rounded up to 5, capped at 4 hours
#[must_use]
pub fn estimate_minutes(step: &str) -> u32 {
    let words = u32::try_from(tokenize(step).len()).unwrap_or(u32::MAX);
    let raw = 15u32.saturating_add(words.saturating_mul(3));
    (raw.div_ceil(5) * 5).min(240)
}

/// Names a step waits on
#[must_use]
pub fn step_dependencies(step: &str) -> Vec<String> {
    STEP_DEPENDENCY
        .captures_iter(step)
        .map(|caps| caps[1].trim().to_string())
        .filter(|dep| !dep.is_empty())
        .collect()
}

/// Ordered plan from step items
#[must_use]
pub fn plan_implementation(items: &[String]) -> Option<ImplementationPlan> {
    let steps: Vec<ImplementationStep> = items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .enumerate()
        .map(|(i, text)| ImplementationStep {
            order: i + 1,
            description: text.trim().to_string(),
            estimated_minutes: estimate_minutes(text),
            dependencies: step_dependencies(text),
        })
        .collect();
    if steps.is_empty() {
        return None;
    }
    let total_estimated_minutes = steps.iter().map(|s| s.estimated_minutes).sum();
    Some(ImplementationPlan {
        steps,
        total_estimated_minutes,
    })
}
