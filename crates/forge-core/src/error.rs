//! Error types for the generator
//!
//! [`ForgeError`] collects the errors of every stage. The generator never
//! returns it from its pipeline entry points; it is folded into a failed
//! [`GenerationResult`](crate::GenerationResult) at the boundary.

use forge_artifact::ArtifactError;
use forge_gate::GateError;
use forge_patterns::PatternError;
use forge_transform::TransformError;

/// Result alias for generator operations
pub type Result<T, E = ForgeError> = std::result::Result<T, E>;

/// Generator errors
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Transformation failed
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Pattern library rejected an operation
    #[error("pattern library error: {0}")]
    Pattern(#[from] PatternError),

    /// Validation gate rejected an operation
    #[error("validation gate error: {0}")]
    Gate(#[from] GateError),

    /// Fingerprinting or encoding failed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Envelope encoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requirements cannot produce an artifact
    #[error("invalid requirements: {0}")]
    InvalidRequirements(String),

    /// A stage panicked
    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

impl ForgeError {
    /// Whether the caller's input caused the failure
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Transform(e) => e.is_input_error(),
            Self::InvalidRequirements(_) => true,
            _ => false,
        }
    }

    /// Whether the failure came from a crash rather than a checked error
    #[inline]
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value lies outside its allowed range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Dotted field path
        field: &'static str,
        /// Offending value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// A count must be positive
    #[error("{field} must be greater than zero")]
    Zero {
        /// Dotted field path
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_input_errors_are_classified() {
        let err = ForgeError::from(TransformError::UnsupportedInput("array".into()));
        assert!(err.is_input_error());
        assert!(!err.is_panic());
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn range_error_names_field() {
        let err = ConfigError::OutOfRange {
            field: "gate.pass_threshold",
            value: 120.0,
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(err.to_string(), "gate.pass_threshold = 120 is outside [0, 100]");
    }
}
