//! Transformer configuration and per-call overrides

use forge_artifact::Complexity;
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::PhaseTransformer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Minimum share of significant source words kept in the output
    pub preservation_threshold: f64,
    /// Score the description
    pub analyze_description: bool,
    /// Bucket and prioritize requirements
    pub analyze_requirements: bool,
    /// Build an implementation plan
    pub plan_implementation: bool,
    /// Leading requirements that get high priority
    pub high_priority_count: usize,
    /// Following requirements that get medium priority
    pub medium_priority_count: usize,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            preservation_threshold: 0.8,
            analyze_description: true,
            analyze_requirements: true,
            plan_implementation: true,
            high_priority_count: 3,
            medium_priority_count: 4,
        }
    }
}

impl TransformerConfig {
    /// With preservation threshold
    #[inline]
    #[must_use]
    pub fn with_preservation_threshold(mut self, threshold: f64) -> Self {
        self.preservation_threshold = threshold;
        self
    }

    /// Disable all enrichment
    #[must_use]
    pub fn without_enrichment(mut self) -> Self {
        self.analyze_description = false;
        self.analyze_requirements = false;
        self.plan_implementation = false;
        self
    }
}

/// Caller-supplied values that override what the input says
///
/// Each applied override is recorded as a `modified` change entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialPhaseConfig {
    /// Artifact id
    pub id: Option<String>,
    /// Artifact name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Objective
    pub objective: Option<String>,
    /// Dependencies
    pub dependencies: Option<Vec<String>>,
    /// Complexity
    pub complexity: Option<Complexity>,
}

impl PartialPhaseConfig {
    /// Overrides carrying only an id
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With objective
    #[inline]
    #[must_use]
    pub fn objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    /// With dependencies
    #[must_use]
    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    /// With complexity
    #[inline]
    #[must_use]
    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }
}
