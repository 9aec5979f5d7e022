//! Error types for the pattern library

/// Result alias for pattern library operations
pub type Result<T, E = PatternError> = std::result::Result<T, E>;

/// Pattern library errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// A required field is empty
    #[error("pattern field '{field}' must not be empty")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// A score lies outside `[0, 1]`
    #[error("pattern field '{field}' out of range [0, 1]: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Id already stored
    #[error("pattern already exists: {0}")]
    DuplicateId(String),

    /// Description too close to a stored pattern
    #[error("pattern duplicates '{existing}' (description overlap {similarity:.2})")]
    DuplicateDescription {
        /// Id of the stored near-duplicate
        existing: String,
        /// Measured overlap
        similarity: f64,
    },

    /// Library full and nothing could be evicted
    #[error("pattern library at capacity ({max} patterns)")]
    CapacityExceeded {
        /// Configured maximum
        max: usize,
    },

    /// Unknown id
    #[error("pattern not found: {0}")]
    NotFound(String),

    /// Snapshot rejected on import
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl PatternError {
    /// Create not-found error
    #[inline]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Whether retrying after a cleanup could succeed
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }
}
