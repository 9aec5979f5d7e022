//! Validation gate configuration

use forge_artifact::CanonicalSection;
use serde::{Deserialize, Serialize};

/// Per-category minimum quality scores in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Sentence-length readability
    pub clarity: f64,
    /// Section coverage and length
    pub completeness: f64,
    /// Action-verb share of items
    pub actionability: f64,
    /// Measurable criteria share
    pub testability: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            clarity: 0.8,
            completeness: 0.85,
            actionability: 0.9,
            testability: 0.75,
        }
    }
}

impl QualityThresholds {
    /// Same threshold for every category
    #[must_use]
    pub fn uniform(threshold: f64) -> Self {
        Self {
            clarity: threshold,
            completeness: threshold,
            actionability: threshold,
            testability: threshold,
        }
    }

    /// `(name, threshold)` pairs in reporting order
    #[must_use]
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("clarity", self.clarity),
            ("completeness", self.completeness),
            ("actionability", self.actionability),
            ("testability", self.testability),
        ]
    }
}

/// Tunables for [`crate::ValidationGate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum overall score to pass, `[0, 100]`
    pub pass_threshold: f64,
    /// Sections that must be populated
    pub required_sections: Vec<CanonicalSection>,
    /// Quality category thresholds
    pub quality: QualityThresholds,
    /// Fill missing required fields on failure
    pub auto_fix: bool,
    /// Results kept per artifact
    pub history_limit: usize,
    /// Scores kept per artifact
    pub trend_limit: usize,
    /// Artifacts with retained history; the least recently validated is dropped first
    pub tracked_artifacts: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 70.0,
            required_sections: vec![
                CanonicalSection::Objective,
                CanonicalSection::SuccessCriteria,
                CanonicalSection::ContextRequirements,
                CanonicalSection::ValidationCheckpoints,
            ],
            quality: QualityThresholds::default(),
            auto_fix: false,
            history_limit: 10,
            trend_limit: 20,
            tracked_artifacts: 1000,
        }
    }
}

impl GateConfig {
    /// With pass threshold
    #[inline]
    #[must_use]
    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// With required sections
    #[must_use]
    pub fn with_required_sections(
        mut self,
        sections: impl IntoIterator<Item = CanonicalSection>,
    ) -> Self {
        self.required_sections = sections.into_iter().collect();
        self
    }

    /// With quality thresholds
    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: QualityThresholds) -> Self {
        self.quality = quality;
        self
    }

    /// With auto-fix toggle
    #[inline]
    #[must_use]
    pub fn with_auto_fix(mut self, enabled: bool) -> Self {
        self.auto_fix = enabled;
        self
    }

    /// With cap on artifacts whose history is retained
    #[inline]
    #[must_use]
    pub fn with_tracked_artifacts(mut self, limit: usize) -> Self {
        self.tracked_artifacts = limit;
        self
    }

    /// Whether `section` is required
    #[inline]
    #[must_use]
    pub fn requires(&self, section: CanonicalSection) -> bool {
        self.required_sections.contains(&section)
    }
}
