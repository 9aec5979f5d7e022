//! Phase artifact
//!
//! [`PhaseArtifact`] is the canonical requirements artifact produced by the
//! transformer, enriched by the generator and scored by the gate. Every
//! optional canonical section is an explicit `Option`: `None` means the
//! section is absent, `Some(vec![])` means present but empty, and the two
//! are never conflated.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ArtifactError;
use crate::fingerprint::Fingerprint;
use crate::pattern::ExamplePattern;

/// Canonical phase artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseArtifact {
    /// Stable identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// What the phase must achieve
    #[serde(default)]
    pub objective: Option<String>,
    /// Ordered success criteria
    #[serde(default)]
    pub success_criteria: Option<Vec<String>>,
    /// Ordered context requirements
    #[serde(default)]
    pub context_requirements: Option<Vec<String>>,
    /// Ordered validation checkpoints
    #[serde(default)]
    pub validation_checkpoints: Option<Vec<String>>,
    /// Attached example patterns
    #[serde(default)]
    pub example_patterns: Option<Vec<ExamplePattern>>,
    /// Ids of phases this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Derived complexity bucket
    #[serde(default)]
    pub complexity: Complexity,
    /// Per-section enrichment results
    #[serde(default)]
    pub enrichment: PhaseEnrichment,
    /// Provenance and change history
    #[serde(default)]
    pub metadata: PhaseMetadata,
}

impl PhaseArtifact {
    /// Create an artifact with only the mandatory top-level fields
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            objective: None,
            success_criteria: None,
            context_requirements: None,
            validation_checkpoints: None,
            example_patterns: None,
            dependencies: Vec::new(),
            complexity: Complexity::default(),
            enrichment: PhaseEnrichment::default(),
            metadata: PhaseMetadata::default(),
        }
    }

    /// With objective
    #[inline]
    #[must_use]
    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    /// With success criteria
    #[must_use]
    pub fn with_success_criteria<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.success_criteria = Some(items.into_iter().map(Into::into).collect());
        self
    }

    /// With context requirements
    #[must_use]
    pub fn with_context_requirements<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_requirements = Some(items.into_iter().map(Into::into).collect());
        self
    }

    /// With validation checkpoints
    #[must_use]
    pub fn with_validation_checkpoints<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_checkpoints = Some(items.into_iter().map(Into::into).collect());
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

    /// Whether `section` is present and non-empty
    #[must_use]
    pub fn has_section(&self, section: CanonicalSection) -> bool {
        match section {
            CanonicalSection::Objective => self
                .objective
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty()),
            CanonicalSection::SuccessCriteria => non_empty(self.success_criteria.as_deref()),
            CanonicalSection::ContextRequirements => non_empty(self.context_requirements.as_deref()),
            CanonicalSection::ValidationCheckpoints => {
                non_empty(self.validation_checkpoints.as_deref())
            }
            CanonicalSection::ExamplePatterns => self
                .example_patterns
                .as_ref()
                .is_some_and(|p| !p.is_empty()),
        }
    }

    /// Whether `section` is entirely absent (`None`)
    #[must_use]
    pub fn is_absent(&self, section: CanonicalSection) -> bool {
        match section {
            CanonicalSection::Objective => self.objective.is_none(),
            CanonicalSection::SuccessCriteria => self.success_criteria.is_none(),
            CanonicalSection::ContextRequirements => self.context_requirements.is_none(),
            CanonicalSection::ValidationCheckpoints => self.validation_checkpoints.is_none(),
            CanonicalSection::ExamplePatterns => self.example_patterns.is_none(),
        }
    }

    /// Number of attached example patterns
    #[inline]
    #[must_use]
    pub fn example_count(&self) -> usize {
        self.example_patterns.as_ref().map_or(0, Vec::len)
    }

    /// All prose of the artifact, one block per line
    ///
    /// Used by quality heuristics that look at the artifact as a whole.
    #[must_use]
    pub fn prose(&self) -> String {
        let mut out = Vec::new();
        out.push(self.description.as_str());
        if let Some(objective) = &self.objective {
            out.push(objective.as_str());
        }
        for list in [
            &self.success_criteria,
            &self.context_requirements,
            &self.validation_checkpoints,
        ]
        .into_iter()
        .flatten()
        {
            out.extend(list.iter().map(String::as_str));
        }
        out.join("\n")
    }
}

fn non_empty(items: Option<&[String]>) -> bool {
    items.is_some_and(|v| v.iter().any(|s| !s.trim().is_empty()))
}

/// Optional canonical sections of a [`PhaseArtifact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalSection {
    /// `objective`
    Objective,
    /// `successCriteria`
    SuccessCriteria,
    /// `contextRequirements`
    ContextRequirements,
    /// `validationCheckpoints`
    ValidationCheckpoints,
    /// `examplePatterns`
    ExamplePatterns,
}

impl CanonicalSection {
    /// All sections in canonical order
    pub const ALL: [CanonicalSection; 5] = [
        Self::Objective,
        Self::SuccessCriteria,
        Self::ContextRequirements,
        Self::ValidationCheckpoints,
        Self::ExamplePatterns,
    ];

    /// Field name as serialized
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Objective => "objective",
            Self::SuccessCriteria => "successCriteria",
            Self::ContextRequirements => "contextRequirements",
            Self::ValidationCheckpoints => "validationCheckpoints",
            Self::ExamplePatterns => "examplePatterns",
        }
    }
}

impl fmt::Display for CanonicalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for CanonicalSection {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.field_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ArtifactError::UnknownSection(s.to_string()))
    }
}

/// Complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Weighted score up to 5
    Low,
    /// Weighted score up to 10
    #[default]
    Medium,
    /// Anything above
    High,
}

impl Complexity {
    /// Bucket a weighted complexity score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 5.0 {
            Self::Low
        } else if score <= 10.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl FromStr for Complexity {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ArtifactError::UnknownComplexity(other.to_string())),
        }
    }
}

/// Priority shared by requirements and recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice to have
    #[default]
    Low,
    /// Should be addressed
    Medium,
    /// Must be addressed
    High,
}

/// Enrichment results, one independently optional block per section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseEnrichment {
    /// Scores for the description text
    #[serde(default)]
    pub description: Option<DescriptionAnalysis>,
    /// Bucketed, prioritized requirements
    #[serde(default)]
    pub requirements: Option<RequirementBreakdown>,
    /// Ordered implementation steps
    #[serde(default)]
    pub implementation: Option<ImplementationPlan>,
}

/// Description quality scores, each in `[0, 1]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionAnalysis {
    /// From sentence-length distribution
    pub clarity: f64,
    /// From word count and paragraph breaks
    pub completeness: f64,
    /// From action-verb density
    pub actionability: f64,
    /// Words in the description
    pub word_count: usize,
    /// Sentences in the description
    pub sentence_count: usize,
}

/// Requirements grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementBreakdown {
    /// Behavioral requirements
    pub functional: Vec<PrioritizedRequirement>,
    /// Quality attributes (performance, security, ...)
    pub non_functional: Vec<PrioritizedRequirement>,
    /// Technology and interface constraints
    pub technical: Vec<PrioritizedRequirement>,
}

impl RequirementBreakdown {
    /// Total number of requirements
    #[must_use]
    pub fn len(&self) -> usize {
        self.functional.len() + self.non_functional.len() + self.technical.len()
    }

    /// Whether no requirement was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All requirements in original order
    #[must_use]
    pub fn in_order(&self) -> Vec<&PrioritizedRequirement> {
        let mut all: Vec<_> = self
            .functional
            .iter()
            .chain(&self.non_functional)
            .chain(&self.technical)
            .collect();
        all.sort_by_key(|r| r.position);
        all
    }
}

/// One requirement with its position-derived priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedRequirement {
    /// Requirement text
    pub text: String,
    /// Derived priority
    pub priority: Priority,
    /// Zero-based position in the source list
    pub position: usize,
}

/// Ordered implementation steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationPlan {
    /// Steps in source order
    pub steps: Vec<ImplementationStep>,
    /// Sum of step estimates
    pub total_estimated_minutes: u32,
}

/// A single implementation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationStep {
    /// One-based order
    pub order: usize,
    /// Step text without its list marker
    pub description: String,
    /// Naive duration estimate
    pub estimated_minutes: u32,
    /// Names extracted from "after X" / "requires X" / "depends on X" / "needs X"
    pub dependencies: Vec<String>,
}

/// Where the artifact came from and how it changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseMetadata {
    /// When the artifact was first built
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the transformer last produced it
    #[serde(default)]
    pub transformed_at: Option<DateTime<Utc>>,
    /// Shape of the source input
    #[serde(default)]
    pub source_format: Option<SourceFormat>,
    /// Fingerprint of the source input
    #[serde(default)]
    pub source_fingerprint: Option<Fingerprint>,
    /// Template used by generation, if any
    #[serde(default)]
    pub template_id: Option<String>,
    /// Every synthesis and override, in order
    #[serde(default)]
    pub changes: Vec<ChangeEntry>,
    /// Sections without a canonical home, verbatim
    #[serde(default)]
    pub extra_sections: IndexMap<String, String>,
}

/// Source shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Free or header-structured text
    Text,
    /// Pre-structured record
    Structured,
    /// Built by generation rather than transformation
    Generated,
}

/// One recorded change to the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// What happened
    pub kind: ChangeKind,
    /// Affected section or field
    pub section: String,
    /// Human-readable summary
    pub description: String,
    /// How much the change matters
    pub impact: Impact,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl ChangeEntry {
    /// Record a change now
    #[must_use]
    pub fn now(
        kind: ChangeKind,
        section: impl Into<String>,
        description: impl Into<String>,
        impact: Impact,
    ) -> Self {
        Self {
            kind,
            section: section.into(),
            description: description.into(),
            impact,
            timestamp: Utc::now(),
        }
    }
}

/// Kind of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Section synthesized
    Added,
    /// Section overridden
    Modified,
    /// Section dropped
    Removed,
}

/// Impact level of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Cosmetic
    Low,
    /// Changes meaning of a secondary section
    Medium,
    /// Changes what the phase is about
    High,
}
