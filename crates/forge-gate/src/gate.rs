//! The validation gate
//!
//! Runs structural, quality and custom validators in sequence, merges their
//! reports, derives recommendations and records the result in a bounded
//! per-artifact history.

use chrono::Utc;
use forge_artifact::{
    CanonicalSection, IssueType, PhaseArtifact, Priority, Recommendation, RecommendationKind,
    ValidationIssue, ValidationResult,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::custom::CustomValidator;
use crate::error::GateError;
use crate::history::ValidationHistory;
use crate::quality::{HeuristicQualityScorer, QualityScorer, QualityValidator, QUALITY};
use crate::report::ValidatorReport;
use crate::structural::{StructuralValidator, STRUCTURAL};

/// Placeholder written by auto-fix
pub const AUTO_FIX_PLACEHOLDER: &str = "[auto-generated: needs review]";

/// Severity at which an error becomes a high-priority fix
const FIX_SEVERITY: u8 = 7;

/// Structural and heuristic quality gate
pub struct ValidationGate {
    config: GateConfig,
    scorer: Arc<dyn QualityScorer>,
    validators: RwLock<IndexMap<String, Arc<dyn CustomValidator>>>,
    history: ValidationHistory,
}

impl fmt::Debug for ValidationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationGate")
            .field("config", &self.config)
            .field("scorer", &self.scorer)
            .field("validators", &self.validator_ids())
            .finish_non_exhaustive()
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl ValidationGate {
    /// Create gate with the heuristic quality scorer
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self::with_scorer(config, Arc::new(HeuristicQualityScorer::default()))
    }

    /// Create gate with a custom quality scorer
    #[must_use]
    pub fn with_scorer(config: GateConfig, scorer: Arc<dyn QualityScorer>) -> Self {
        let history = ValidationHistory::new(
            config.history_limit,
            config.trend_limit,
            config.tracked_artifacts,
        );
        Self {
            config,
            scorer,
            validators: RwLock::new(IndexMap::new()),
            history,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Register a custom validator under its id
    ///
    /// # Errors
    /// Returns [`GateError::DuplicateValidator`] if the id is taken
    pub fn register_validator(&self, validator: Arc<dyn CustomValidator>) -> Result<(), GateError> {
        let id = validator.id().to_string();
        let mut validators = self.validators.write();
        if validators.contains_key(&id) {
            return Err(GateError::DuplicateValidator(id));
        }
        info!(validator = %id, "Registered custom validator");
        validators.insert(id, validator);
        Ok(())
    }

    /// Remove a custom validator
    ///
    /// # Errors
    /// Returns [`GateError::UnknownValidator`] for an unknown id
    pub fn unregister_validator(&self, id: &str) -> Result<(), GateError> {
        self.validators
            .write()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| GateError::UnknownValidator(id.to_string()))
    }

    /// Registered validator ids in registration order
    #[must_use]
    pub fn validator_ids(&self) -> Vec<String> {
        self.validators.read().keys().cloned().collect()
    }

    /// Validate an artifact and record the result
    pub async fn validate(&self, artifact: &PhaseArtifact) -> ValidationResult {
        let mut result = self.evaluate(artifact).await;
        self.history.record(&mut result);
        log_result(&result);
        result
    }

    /// Validate, then apply auto-fix if enabled and validation failed
    ///
    /// Auto-fix only fills empty `name`, `description` and, when required,
    /// `objective` with a placeholder. The returned result describes the
    /// artifact *before* the fixes; re-validate to score the fixed version.
    pub async fn validate_and_fix(&self, artifact: &mut PhaseArtifact) -> ValidationResult {
        let mut result = self.evaluate(artifact).await;
        if self.config.auto_fix && !result.passed {
            result.auto_fixes = self.auto_fix(artifact);
            if !result.auto_fixes.is_empty() {
                info!(
                    artifact = %artifact.id,
                    fixes = ?result.auto_fixes,
                    "Applied auto-fix"
                );
            }
        }
        self.history.record(&mut result);
        log_result(&result);
        result
    }

    /// Stored results for an artifact, oldest first
    #[must_use]
    pub fn history(&self, artifact_id: &str) -> Vec<ValidationResult> {
        self.history.results(artifact_id)
    }

    /// Stored scores for an artifact, oldest first
    #[must_use]
    pub fn trend(&self, artifact_id: &str) -> Vec<f64> {
        self.history.trend(artifact_id)
    }

    /// Forget an artifact's history; returns whether there was any
    pub fn clear_history(&self, artifact_id: &str) -> bool {
        self.history.clear(artifact_id)
    }

    async fn evaluate(&self, artifact: &PhaseArtifact) -> ValidationResult {
        let mut category_scores = BTreeMap::new();
        let mut issues = Vec::new();
        let mut validator_scores = Vec::new();

        let structural = StructuralValidator::validate(artifact, &self.config);
        category_scores.insert(STRUCTURAL.to_string(), structural.score);
        validator_scores.push(structural.score);
        issues.extend(structural.issues);

        let scores = self.scorer.score(artifact);
        let quality = QualityValidator::validate(&scores, &self.config.quality);
        for (category, score) in scores.entries() {
            category_scores.insert(category.to_string(), score * 100.0);
        }
        category_scores.insert(QUALITY.to_string(), quality.score);
        validator_scores.push(quality.score);
        issues.extend(quality.issues);

        // snapshot so no lock is held across awaits
        let validators: Vec<Arc<dyn CustomValidator>> =
            self.validators.read().values().cloned().collect();
        for validator in validators {
            let id = validator.id().to_string();
            let report = match validator.validate(artifact).await {
                Ok(report) => ValidatorReport {
                    score: report.score.clamp(0.0, 100.0),
                    issues: report.issues,
                },
                Err(err) => {
                    warn!(validator = %id, error = %err, "Custom validator failed");
                    ValidatorReport::new(0.0).with_issue(ValidationIssue::error(
                        format!("validator-failed-{id}"),
                        id.clone(),
                        8,
                        err.to_string(),
                        "Fix the validator or unregister it",
                    ))
                }
            };
            category_scores.insert(id, report.score);
            validator_scores.push(report.score);
            issues.extend(report.issues);
        }

        let overall_score = validator_scores.iter().sum::<f64>() / validator_scores.len() as f64;
        let recommendations = recommend(&issues);

        let mut result = ValidationResult {
            artifact_id: artifact.id.clone(),
            passed: false,
            overall_score,
            category_scores,
            issues,
            recommendations,
            improvement_score: 0.0,
            auto_fixes: Vec::new(),
            validated_at: Utc::now(),
        };
        result.passed =
            overall_score >= self.config.pass_threshold && !result.has_blocking_issues();
        result
    }

    fn auto_fix(&self, artifact: &mut PhaseArtifact) -> Vec<String> {
        let mut fixes = Vec::new();
        if artifact.name.trim().is_empty() {
            artifact.name = AUTO_FIX_PLACEHOLDER.to_string();
            fixes.push("name".to_string());
        }
        if artifact.description.trim().is_empty() {
            artifact.description = AUTO_FIX_PLACEHOLDER.to_string();
            fixes.push("description".to_string());
        }
        if self.config.requires(CanonicalSection::Objective)
            && !artifact.has_section(CanonicalSection::Objective)
        {
            artifact.objective = Some(AUTO_FIX_PLACEHOLDER.to_string());
            fixes.push(CanonicalSection::Objective.field_name().to_string());
        }
        fixes
    }
}

fn recommend(issues: &[ValidationIssue]) -> Vec<Recommendation> {
    issues
        .iter()
        .filter_map(|issue| match issue.issue_type {
            IssueType::Error if issue.severity >= FIX_SEVERITY => Some(Recommendation {
                priority: Priority::High,
                kind: RecommendationKind::Fix,
                issue_id: issue.id.clone(),
                message: issue.suggestion.clone(),
            }),
            IssueType::Warning => Some(Recommendation {
                priority: Priority::Medium,
                kind: RecommendationKind::Improvement,
                issue_id: issue.id.clone(),
                message: issue.suggestion.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn log_result(result: &ValidationResult) {
    metrics::counter!(
        "forge_gate_validations_total",
        "passed" => if result.passed { "true" } else { "false" }
    )
    .increment(1);
    debug!(
        artifact = %result.artifact_id,
        score = result.overall_score,
        passed = result.passed,
        issues = result.issues.len(),
        improvement = result.improvement_score,
        "Validated artifact"
    );
}
