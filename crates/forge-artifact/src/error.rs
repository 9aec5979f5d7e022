//! Error types for the artifact model

/// Errors raised by artifact model helpers
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// JSON encoding of an artifact or input failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fingerprint string was not 32 hex-encoded bytes
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Unknown canonical section name
    #[error("unknown section: '{0}'")]
    UnknownSection(String),

    /// Unknown complexity label
    #[error("unknown complexity: '{0}'")]
    UnknownComplexity(String),
}
