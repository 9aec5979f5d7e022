//! Error types for the validation gate

/// Result alias for gate operations
pub type Result<T, E = GateError> = std::result::Result<T, E>;

/// Validation gate errors
///
/// Validation itself never fails; these cover validator registration and
/// failures reported by custom validators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// A validator with this id is already registered
    #[error("validator already registered: {0}")]
    DuplicateValidator(String),

    /// No validator with this id
    #[error("unknown validator: {0}")]
    UnknownValidator(String),

    /// A custom validator could not produce a report
    #[error("validator '{id}' failed: {message}")]
    ValidatorFailed {
        /// Validator id
        id: String,
        /// Failure description
        message: String,
    },
}

impl GateError {
    /// Create validator failure
    pub fn validator_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidatorFailed {
            id: id.into(),
            message: message.into(),
        }
    }
}
