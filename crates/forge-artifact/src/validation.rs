//! Validation results
//!
//! Shapes produced by the validation gate and carried in the generator's
//! result envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::phase::Priority;

/// Severity at or above which an issue blocks a pass
pub const BLOCKING_SEVERITY: u8 = 8;

/// Outcome of validating one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Artifact that was validated
    pub artifact_id: String,
    /// Whether the artifact passed the gate
    pub passed: bool,
    /// Mean of per-validator scores, `[0, 100]`
    pub overall_score: f64,
    /// Scores by validator and quality category
    pub category_scores: BTreeMap<String, f64>,
    /// Everything the validators found
    pub issues: Vec<ValidationIssue>,
    /// Actions derived from the issues
    pub recommendations: Vec<Recommendation>,
    /// Delta to the previous score for this artifact, or 0
    pub improvement_score: f64,
    /// Fields filled in by auto-fix
    #[serde(default)]
    pub auto_fixes: Vec<String>,
    /// When validation ran
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Synthetic zero-score failure used when the pipeline crashed
    #[must_use]
    pub fn failed(artifact_id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            artifact_id: artifact_id.into(),
            passed: false,
            overall_score: 0.0,
            category_scores: BTreeMap::new(),
            issues: vec![ValidationIssue::error(
                "pipeline-failure",
                "pipeline",
                10,
                message,
                "Inspect the error list of the result envelope",
            )],
            recommendations: Vec::new(),
            improvement_score: 0.0,
            auto_fixes: Vec::new(),
            validated_at: Utc::now(),
        }
    }

    /// Issues of type error
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.issue_type == IssueType::Error)
    }

    /// Issues of type warning
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.issue_type == IssueType::Warning)
    }

    /// Whether any issue is an error or reaches [`BLOCKING_SEVERITY`]
    #[must_use]
    pub fn has_blocking_issues(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.issue_type == IssueType::Error || i.severity >= BLOCKING_SEVERITY)
    }

    /// Find an issue by id
    #[must_use]
    pub fn issue(&self, id: &str) -> Option<&ValidationIssue> {
        self.issues.iter().find(|i| i.id == id)
    }
}

/// Something a validator found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Stable id, e.g. `missing-section-objective`
    pub id: String,
    /// Validator or quality category that raised it
    pub category: String,
    /// 0 (trivial) to 10 (fatal)
    pub severity: u8,
    /// Error, warning or info
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// What is wrong
    pub message: String,
    /// How to fix it
    pub suggestion: String,
}

impl ValidationIssue {
    /// Build an issue, clamping severity to 10
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        severity: u8,
        issue_type: IssueType,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            severity: severity.min(10),
            issue_type,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Error issue
    #[must_use]
    pub fn error(
        id: impl Into<String>,
        category: impl Into<String>,
        severity: u8,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::new(id, category, severity, IssueType::Error, message, suggestion)
    }

    /// Warning issue
    #[must_use]
    pub fn warning(
        id: impl Into<String>,
        category: impl Into<String>,
        severity: u8,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::new(id, category, severity, IssueType::Warning, message, suggestion)
    }

    /// Informational issue
    #[must_use]
    pub fn info(
        id: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, category, 1, IssueType::Info, message, String::new())
    }
}

/// Issue type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Blocks a pass
    Error,
    /// Degrades quality
    Warning,
    /// For the record
    Info,
}

/// Action derived from an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// How urgent
    pub priority: Priority,
    /// Fix or improvement
    pub kind: RecommendationKind,
    /// Issue this came from
    pub issue_id: String,
    /// What to do
    pub message: String,
}

/// Kind of recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Required to pass
    Fix,
    /// Raises quality
    Improvement,
}
