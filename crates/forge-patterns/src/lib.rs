//! Phase Forge Pattern Library
//!
//! Indexed store of example patterns with similarity search, a
//! generation-versioned result cache and per-pattern usage learning.
//!
//! # Core Concepts
//!
//! - [`PatternLibrary`]: the store; add, update, remove, search, evict
//! - [`PatternIndex`]: category, domain and complexity-band indices
//! - [`SearchCriteria`] / [`PatternMatch`]: search input and ranked output
//! - [`LibraryAnalytics`]: coverage and usage statistics
//! - [`LibrarySnapshot`]: export and import of the whole library
//!
//! # Example
//!
//! ```rust
//! use forge_artifact::ExamplePattern;
//! use forge_patterns::{PatternLibrary, SearchCriteria};
//!
//! # async fn demo() {
//! let library = PatternLibrary::default();
//! library
//!     .add_pattern(
//!         ExamplePattern::new("rest", "REST", "RESTful API endpoint design", "web")
//!             .with_quality(0.9),
//!     )
//!     .unwrap();
//!
//! let criteria = SearchCriteria::default().with_min_similarity(0.2);
//! let matches = library.find_similar("design a REST API", &criteria).await;
//! assert_eq!(matches[0].pattern.id, "rest");
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod analytics;
mod cache;
mod config;
mod error;
mod index;
mod library;
mod search;
mod snapshot;

pub use analytics::{LibraryAnalytics, PatternUsage, QualityDistribution, MOST_USED_LIMIT};
pub use cache::SearchCacheStats;
pub use config::PatternLibraryConfig;
pub use error::{PatternError, Result};
pub use index::{ComplexityBand, PatternIndex};
pub use library::{PatternLibrary, PatternUpdate};
pub use search::{
    confidence, rank_score, relevance, PatternFeedback, PatternMatch, SearchCriteria,
    DEFAULT_MAX_EXAMPLES, DEFAULT_MIN_SIMILARITY,
};
pub use snapshot::{LibrarySnapshot, SnapshotEntry, SNAPSHOT_VERSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
