//! Portable library snapshots
//!
//! A snapshot carries every pattern with its learning record. Importing one
//! replaces the library contents wholesale.

use chrono::{DateTime, Utc};
use forge_artifact::{ExamplePattern, PatternEvolution};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// One stored pattern and its learning record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Pattern
    pub pattern: ExamplePattern,
    /// Learning record; a fresh one is created on import when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolution: Option<PatternEvolution>,
}

/// Serializable library contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    /// Format version
    pub version: u32,
    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,
    /// Patterns sorted by id
    pub entries: Vec<SnapshotEntry>,
}

impl LibrarySnapshot {
    /// Empty snapshot
    #[must_use]
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            entries,
        }
    }

    /// Encode as JSON
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn to_json(&self) -> Result<String, PatternError> {
        serde_json::to_string_pretty(self).map_err(|e| PatternError::InvalidSnapshot(e.to_string()))
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns error on malformed JSON or an unsupported version
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| PatternError::InvalidSnapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PatternError::InvalidSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// Number of patterns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no patterns
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
