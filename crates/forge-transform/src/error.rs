//! Error types for the phase transformer

use forge_artifact::ArtifactError;

/// Result alias for transformer operations
pub type Result<T, E = TransformError> = std::result::Result<T, E>;

/// Phase transformer errors
///
/// Only input shapes the transformer cannot read at all are errors;
/// everything else degrades to warnings on the outcome.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Neither text nor a structured record
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A structured field has the wrong type
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        /// Field name
        field: String,
        /// What was wrong
        message: String,
    },

    /// Fingerprinting or serializing failed
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// JSON encoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransformError {
    /// Create invalid-field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the caller supplied input the transformer cannot read
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedInput(_) | Self::InvalidField { .. })
    }
}
