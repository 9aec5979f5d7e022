//! Specification documents
//!
//! The immutable raw input of the pipeline. The pipeline only ever borrows
//! a document; it never rewrites one in place.

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::fingerprint::Fingerprint;
use crate::phase::SourceFormat;

/// Raw pipeline input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum SpecificationDocument {
    /// Free or header-structured text
    Text(String),
    /// Pre-structured record (expected to be a JSON object)
    Structured(serde_json::Value),
}

impl SpecificationDocument {
    /// Text document
    #[inline]
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Structured document
    #[inline]
    #[must_use]
    pub fn structured(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }

    /// Source format tag
    #[must_use]
    pub fn format(&self) -> SourceFormat {
        match self {
            Self::Text(_) => SourceFormat::Text,
            Self::Structured(_) => SourceFormat::Structured,
        }
    }

    /// Fingerprint of the document content
    ///
    /// # Errors
    /// Returns error if a structured body cannot be encoded
    pub fn fingerprint(&self) -> Result<Fingerprint, ArtifactError> {
        match self {
            Self::Text(text) => Ok(Fingerprint::compute_parts([b"text".as_slice(), text.as_bytes()])),
            Self::Structured(value) => {
                let json = serde_json::to_vec(value)?;
                Ok(Fingerprint::compute_parts([b"structured".as_slice(), json.as_slice()]))
            }
        }
    }

    /// All human-written text in the document
    ///
    /// For structured records this is every string leaf, in key order.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                let mut out = Vec::new();
                collect_strings(value, &mut out);
                out.join("\n")
            }
        }
    }
}

impl From<&str> for SpecificationDocument {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SpecificationDocument {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<serde_json::Value> for SpecificationDocument {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
