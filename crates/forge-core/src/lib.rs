//! Phase Forge Core - Generator
//!
//! Turns loosely structured specifications into validated,
//! example-enriched phase artifacts.
//!
//! ```text
//! document ─▶ PhaseTransformer ─▶ PatternLibrary ─▶ ValidationGate ─▶ GenerationResult
//!                                  (examples)       (score, issues)
//! ```
//!
//! The [`PhaseGenerator`] owns one instance of each component. Both entry
//! points return a [`GenerationResult`] envelope and never an error;
//! failures and panics produce a failed envelope with a zero-score
//! validation and zeroed metrics.
//!
//! # Example
//!
//! ```rust
//! use forge_artifact::SpecificationDocument;
//! use forge_core::PhaseGenerator;
//! use forge_transform::PartialPhaseConfig;
//!
//! # async fn example() {
//! let generator = PhaseGenerator::default();
//! let doc = SpecificationDocument::text("# Login\nLet users sign in with email.");
//!
//! let first = generator
//!     .transform_existing("login", &doc, &PartialPhaseConfig::default())
//!     .await;
//! let second = generator
//!     .transform_existing("login", &doc, &PartialPhaseConfig::default())
//!     .await;
//!
//! assert!(first.success);
//! assert_eq!(second.metrics.cache_hits, 1);
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod generator;
mod templates;
mod types;

pub use cache::TransformCacheStats;
pub use config::{ForgeConfig, GeneratorConfig};
pub use error::{ConfigError, ForgeError, Result};
pub use generator::PhaseGenerator;
pub use templates::{PhaseTemplate, TemplateRegistry, SYNTHESIZED_TEMPLATE_ID};
pub use types::{GenerationContext, GenerationMetrics, GenerationResult, PhaseRequirements};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the pipeline
    pub use crate::{
        ForgeConfig, GenerationContext, GenerationResult, PhaseGenerator, PhaseRequirements,
    };
    pub use forge_artifact::{PhaseArtifact, SpecificationDocument};
    pub use forge_transform::PartialPhaseConfig;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
