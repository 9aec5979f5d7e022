//! Serde helper: `Duration` as whole seconds
//!
//! Use with `#[serde(with = "forge_artifact::duration_secs")]` on config
//! fields.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize as seconds
///
/// # Errors
/// Propagates serializer errors
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Deserialize from seconds
///
/// # Errors
/// Propagates deserializer errors
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}
