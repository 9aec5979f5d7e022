//! Source fingerprints
//!
//! Provides [`Fingerprint`], a 32-byte BLAKE3 digest of a specification
//! document (or any serializable input). The orchestrator compares
//! fingerprints to decide whether a cached transformation still reflects
//! its source.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ArtifactError;

/// A 32-byte content fingerprint (BLAKE3)
///
/// Immutable and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Fingerprint a sequence of parts, length-prefixed so that
    /// `["ab", "c"]` and `["a", "bc"]` differ.
    #[must_use]
    pub fn compute_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Fingerprint a serializable value through its JSON encoding
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn compute_serializable<T>(value: &T) -> Result<Self, ArtifactError>
    where
        T: serde::Serialize,
    {
        let json = serde_json::to_vec(value)?;
        Ok(Self::compute(&json))
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ArtifactError::InvalidFingerprint(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ArtifactError::InvalidFingerprint(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(Fingerprint::compute(b"phase"), Fingerprint::compute(b"phase"));
        assert_ne!(Fingerprint::compute(b"phase"), Fingerprint::compute(b"phase "));
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = Fingerprint::compute_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = Fingerprint::compute_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn display_parses_back() {
        let fp = Fingerprint::compute(b"phase");
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(fp, parsed);
        assert_eq!(fp.to_string().len(), 64);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "abcd".parse::<Fingerprint>().unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidFingerprint(_)));
    }

    #[test]
    fn serializes_as_hex_string() {
        let fp = Fingerprint::compute(b"phase");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json.len(), 66);
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }
}
