//! Phase Forge Validation Gate
//!
//! Scores a [`PhaseArtifact`](forge_artifact::PhaseArtifact) and decides
//! whether it is usable.
//!
//! # Validator Groups
//!
//! 1. [`StructuralValidator`]: required fields and sections, dependency hygiene
//! 2. [`QualityValidator`]: clarity, completeness, actionability and
//!    testability against [`QualityThresholds`], scored by a [`QualityScorer`]
//! 3. [`CustomValidator`]s registered by id
//!
//! The overall score is the mean of the group scores. An artifact passes
//! when that mean reaches the pass threshold and no issue is an error or
//! has severity 8 or more.
//!
//! # Example
//!
//! ```rust
//! use forge_artifact::PhaseArtifact;
//! use forge_gate::ValidationGate;
//!
//! # async fn demo() {
//! let gate = ValidationGate::default();
//! let artifact = PhaseArtifact::new("r", "Reports", "Reports.");
//! let result = gate.validate(&artifact).await;
//! assert!(!result.passed);
//! assert!(result.issue("missing-section-objective").is_some());
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod config;
mod custom;
mod error;
mod gate;
mod history;
mod quality;
mod report;
mod structural;

pub use config::{GateConfig, QualityThresholds};
pub use custom::CustomValidator;
pub use error::{GateError, Result};
pub use gate::{ValidationGate, AUTO_FIX_PLACEHOLDER};
pub use quality::{HeuristicQualityScorer, QualityScorer, QualityScores, QualityValidator, QUALITY};
pub use report::ValidatorReport;
pub use structural::{StructuralValidator, STRUCTURAL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use forge_artifact::BLOCKING_SEVERITY;

    #[tokio::test]
    async fn complete_artifact_passes() {
        let gate = ValidationGate::default();
        let result = gate
            .validate(&forge_test_utils::complete_artifact("auth"))
            .await;
        assert!(result.passed, "{result:#?}");
        assert!(result.overall_score >= 70.0);
        assert!(result.issues.iter().all(|i| i.severity < BLOCKING_SEVERITY));
    }
}
