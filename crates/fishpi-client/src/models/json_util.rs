//! Serde helpers for loosely typed API payloads.

use serde::{Deserialize, Deserializer};

/// Decode `null` as the type's default.
///
/// Pair with `#[serde(default)]` so a missing field and an explicit `null`
/// decode the same way.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
