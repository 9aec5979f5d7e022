//! Workspace configuration
//!
//! [`ForgeConfig`] aggregates the configuration of every component and
//! parses from TOML:
//!
//! ```toml
//! [transformer]
//! preservation_threshold = 0.75
//!
//! [patterns]
//! max_patterns = 500
//! cache_ttl = 120
//!
//! [gate]
//! pass_threshold = 65.0
//!
//! [generator]
//! transform_example_limit = 2
//! ```

use forge_gate::GateConfig;
use forge_patterns::PatternLibraryConfig;
use forge_transform::TransformerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Generator tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Examples attached to a transformed artifact
    pub transform_example_limit: usize,
    /// Similarity floor for transformed artifacts
    pub transform_min_similarity: f64,
    /// Examples attached to a generated artifact
    pub generate_example_limit: usize,
    /// Similarity floor for generated artifacts
    pub generate_min_similarity: f64,
    /// Serve repeated transforms from the cache
    pub enable_cache: bool,
    /// Transformation cache capacity in entries
    pub cache_capacity: u64,
    /// Transformation cache time-to-live
    #[serde(with = "forge_artifact::duration_secs")]
    pub cache_ttl: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            transform_example_limit: 3,
            transform_min_similarity: 0.3,
            generate_example_limit: 5,
            generate_min_similarity: 0.7,
            enable_cache: true,
            cache_capacity: 1000,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl GeneratorConfig {
    /// With cache enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    /// With maximum number of cached transformations
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With transformation cache time-to-live
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// With similarity floor for generated artifacts
    #[inline]
    #[must_use]
    pub fn with_generate_min_similarity(mut self, min: f64) -> Self {
        self.generate_min_similarity = min;
        self
    }
}

/// Configuration of the whole pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Phase transformer
    pub transformer: TransformerConfig,
    /// Pattern library
    pub patterns: PatternLibraryConfig,
    /// Validation gate
    pub gate: GateConfig,
    /// Generator
    pub generator: GeneratorConfig,
}

impl ForgeConfig {
    /// Parse and validate TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns error on malformed TOML or an out-of-range value
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// With transformer configuration
    #[inline]
    #[must_use]
    pub fn with_transformer(mut self, transformer: TransformerConfig) -> Self {
        self.transformer = transformer;
        self
    }

    /// With pattern library configuration
    #[inline]
    #[must_use]
    pub fn with_patterns(mut self, patterns: PatternLibraryConfig) -> Self {
        self.patterns = patterns;
        self
    }

    /// With gate configuration
    #[inline]
    #[must_use]
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    /// With generator configuration
    #[inline]
    #[must_use]
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Check every bounded value
    ///
    /// # Errors
    /// Returns the first value outside its range
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("transformer.preservation_threshold", self.transformer.preservation_threshold)?;
        positive("patterns.max_patterns", self.patterns.max_patterns)?;
        unit("patterns.duplicate_threshold", self.patterns.duplicate_threshold)?;
        range("gate.pass_threshold", self.gate.pass_threshold, 0.0, 100.0)?;
        for (category, threshold) in self.gate.quality.entries() {
            let field = match category {
                "clarity" => "gate.quality.clarity",
                "completeness" => "gate.quality.completeness",
                "actionability" => "gate.quality.actionability",
                _ => "gate.quality.testability",
            };
            unit(field, threshold)?;
        }
        positive("gate.history_limit", self.gate.history_limit)?;
        positive("gate.trend_limit", self.gate.trend_limit)?;
        positive("gate.tracked_artifacts", self.gate.tracked_artifacts)?;
        unit("generator.transform_min_similarity", self.generator.transform_min_similarity)?;
        unit("generator.generate_min_similarity", self.generator.generate_min_similarity)?;
        Ok(())
    }
}

fn range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    range(field, value, 0.0, 1.0)
}

fn positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { field })
    } else {
        Ok(())
    }
}
