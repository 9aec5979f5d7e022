//! Pluggable validators

use async_trait::async_trait;
use forge_artifact::PhaseArtifact;

use crate::error::GateError;
use crate::report::ValidatorReport;

/// A validator registered with the gate by id
///
/// Its score is averaged into the overall score beside the structural and
/// quality scores. An `Err` is reported as a blocking issue with score 0.
#[async_trait]
pub trait CustomValidator: Send + Sync {
    /// Stable id; also the key of its score in `category_scores`
    fn id(&self) -> &str;

    /// Validate an artifact
    async fn validate(&self, artifact: &PhaseArtifact) -> Result<ValidatorReport, GateError>;
}
