//! Phase Forge Artifact Model
//!
//! Shared data model for the phase pipeline.
//!
//! # Core Concepts
//!
//! - [`PhaseArtifact`]: canonical requirements artifact with explicit
//!   optional sections
//! - [`ExamplePattern`] / [`PatternEvolution`]: stored exemplars and their
//!   learning records
//! - [`ValidationResult`]: gate outcome carried in result envelopes
//! - [`SpecificationDocument`]: immutable raw input
//! - [`Fingerprint`]: BLAKE3 digest used to version cached work
//! - [`text`]: lexical heuristics behind the [`TextScorer`] strategy trait
//!
//! # Example
//!
//! ```rust
//! use forge_artifact::{CanonicalSection, PhaseArtifact};
//!
//! let artifact = PhaseArtifact::new("auth", "Authentication", "Add login.")
//!     .with_objective("Users can sign in");
//!
//! assert!(artifact.has_section(CanonicalSection::Objective));
//! assert!(artifact.is_absent(CanonicalSection::SuccessCriteria));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod document;
mod error;
mod fingerprint;
mod pattern;
mod phase;
mod validation;

pub mod duration_secs;
pub mod text;

pub use document::SpecificationDocument;
pub use error::ArtifactError;
pub use fingerprint::Fingerprint;
pub use pattern::{ExamplePattern, PatternEvolution, PatternMetadata, DEFAULT_CATEGORY};
pub use phase::{
    CanonicalSection, ChangeEntry, ChangeKind, Complexity, DescriptionAnalysis, Impact,
    ImplementationPlan, ImplementationStep, PhaseArtifact, PhaseEnrichment, PhaseMetadata,
    PrioritizedRequirement, Priority, RequirementBreakdown, SourceFormat,
};
pub use text::{HeuristicTextScorer, TextProfile, TextScorer};
pub use validation::{
    IssueType, Recommendation, RecommendationKind, ValidationIssue, ValidationResult,
    BLOCKING_SEVERITY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
