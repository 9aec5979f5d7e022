//! Phase Forge Transformer
//!
//! Turns a raw [`SpecificationDocument`](forge_artifact::SpecificationDocument)
//! into a canonical [`PhaseArtifact`](forge_artifact::PhaseArtifact).
//!
//! # Pipeline
//!
//! 1. Parse: markdown or `Label:` headers plus YAML frontmatter for text,
//!    camelCase or snake_case keys for structured records
//! 2. Override: apply [`PartialPhaseConfig`] and record each change
//! 3. Enrich: description analysis, requirement buckets and an
//!    implementation plan
//! 4. Synthesize: fill every absent canonical section
//! 5. Check: measure content preservation against a threshold
//!
//! Header text the parser does not recognize is kept verbatim in
//! `metadata.extra_sections`.
//!
//! # Example
//!
//! ```rust
//! use forge_artifact::SpecificationDocument;
//! use forge_transform::{PartialPhaseConfig, PhaseTransformer};
//!
//! let doc = SpecificationDocument::text("# Login\nLet users sign in with email.");
//! let outcome = PhaseTransformer::default()
//!     .transform(&doc, &PartialPhaseConfig::default())
//!     .unwrap();
//!
//! assert_eq!(outcome.artifact.id, "login");
//! assert!(outcome.artifact.objective.is_some());
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod config;
mod error;
mod preserve;
mod synthesize;
mod transformer;

pub mod enrich;
pub mod sections;

pub use config::{PartialPhaseConfig, TransformerConfig};
pub use error::{Result, TransformError};
pub use preserve::{check as check_preservation, PreservationReport};
pub use transformer::{PhaseTransformer, TransformOutcome, FALLBACK_ID};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
