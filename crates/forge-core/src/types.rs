//! Generator inputs and the result envelope

use forge_artifact::{PhaseArtifact, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ForgeError;

/// Project the generated phase belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationContext {
    /// Project name
    pub project_name: String,
    /// Kind of project, e.g. `web-service`; steers template selection
    pub project_type: String,
    /// Phase currently under way
    pub current_phase: Option<String>,
    /// Phases already completed, oldest first
    pub previous_phases: Vec<String>,
    /// Free-form preferences kept on the artifact
    pub user_preferences: BTreeMap<String, String>,
    /// Capabilities the phase may rely on
    pub system_capabilities: Vec<String>,
    /// Project-wide constraints
    pub constraints: Vec<String>,
}

impl GenerationContext {
    /// Context for a project
    #[must_use]
    pub fn new(project_name: impl Into<String>, project_type: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_type: project_type.into(),
            ..Self::default()
        }
    }

    /// With completed phases
    #[must_use]
    pub fn with_previous_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.previous_phases = phases.into_iter().map(Into::into).collect();
        self
    }

    /// With project constraints
    #[must_use]
    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints = constraints.into_iter().map(Into::into).collect();
        self
    }

    /// With system capabilities
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.system_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// With one user preference
    #[must_use]
    pub fn with_preference(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_preferences.insert(key.into(), value.into());
        self
    }
}

/// What a newly generated phase must achieve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhaseRequirements {
    /// What the phase delivers; drives example search and template choice
    pub objective: String,
    /// Display name
    pub name: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// Behaviors the phase must provide
    pub functional: Vec<String>,
    /// Quality attributes
    pub non_functional: Vec<String>,
    /// Phase-specific constraints
    pub constraints: Vec<String>,
    /// Phase ids this one depends on
    pub dependencies: Vec<String>,
}

impl PhaseRequirements {
    /// Requirements with only an objective
    #[must_use]
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            ..Self::default()
        }
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With functional requirements
    #[must_use]
    pub fn with_functional<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functional = items.into_iter().map(Into::into).collect();
        self
    }

    /// With non-functional requirements
    #[must_use]
    pub fn with_non_functional<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_functional = items.into_iter().map(Into::into).collect();
        self
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }
}

/// Measurements reported with every envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetrics {
    /// Wall-clock time of the call
    pub processing_time_ms: u64,
    /// Weighted template/example/dependency count
    pub complexity_score: u32,
    /// Reported as the validation score
    pub validation_time: f64,
    /// Examples attached to the artifact
    pub example_matches: usize,
    /// Registry templates applied
    pub template_usage: usize,
    /// 1 when served from the transformation cache
    pub cache_hits: u32,
}

/// Result envelope of both generator paths
///
/// `success` reports that the pipeline ran to completion; whether the
/// artifact is usable is `validation.passed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Pipeline completed
    pub success: bool,
    /// The artifact; `None` when the pipeline failed
    pub phase: Option<PhaseArtifact>,
    /// Gate outcome, or a synthetic zero-score failure
    pub validation: ValidationResult,
    /// Measurements; zeroed on failure
    pub metrics: GenerationMetrics,
    /// Non-fatal problems
    pub warnings: Vec<String>,
    /// Why the pipeline failed
    pub errors: Vec<String>,
}

impl GenerationResult {
    /// Envelope for a pipeline that crashed or errored
    #[must_use]
    pub fn failed(artifact_id: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            phase: None,
            validation: ValidationResult::failed(artifact_id, error.clone()),
            metrics: GenerationMetrics::default(),
            warnings: Vec::new(),
            errors: vec![error],
        }
    }

    /// Envelope as pretty JSON for external consumers
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn to_json(&self) -> Result<String, ForgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the pipeline ran and the artifact passed validation
    #[inline]
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.success && self.validation.passed
    }
}
