//! Content preservation check
//!
//! Compares the significant words (longer than three characters) of the
//! source with those of the serialized artifact.

use forge_artifact::text::significant_words;
use forge_artifact::PhaseArtifact;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// Missing words listed in a report
const MISSING_SAMPLE: usize = 20;

/// How much of the source survived the transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreservationReport {
    /// Preserved share of significant source words, `[0, 1]`
    pub ratio: f64,
    /// Distinct significant words in the source
    pub source_words: usize,
    /// Of those, found in the artifact
    pub preserved_words: usize,
    /// Sample of lost words, alphabetical
    pub missing: Vec<String>,
    /// Threshold the ratio was checked against
    pub threshold: f64,
}

impl PreservationReport {
    /// Whether the ratio meets the threshold
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.ratio >= self.threshold
    }
}

/// Measure preservation of `source` in `artifact`
///
/// # Errors
/// Returns error if the artifact cannot be serialized
pub fn check(
    source: &str,
    artifact: &PhaseArtifact,
    threshold: f64,
) -> Result<PreservationReport, TransformError> {
    let source_words = significant_words(source);
    let artifact_words = significant_words(&serde_json::to_string(artifact)?);

    let (kept, lost): (Vec<&String>, Vec<&String>) =
        source_words.iter().partition(|w| artifact_words.contains(*w));

    let ratio = if source_words.is_empty() {
        1.0
    } else {
        kept.len() as f64 / source_words.len() as f64
    };

    Ok(PreservationReport {
        ratio,
        source_words: source_words.len(),
        preserved_words: kept.len(),
        missing: lost.into_iter().take(MISSING_SAMPLE).cloned().collect(),
        threshold,
    })
}
