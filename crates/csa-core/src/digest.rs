//! Canonical topology digests.
//!
//! A digest gives two bootstrap runs a cheap equality check: identical
//! inputs and policy must hash identically. Serialization goes through a
//! recursively key-sorted JSON value so the digest never depends on map
//! iteration order.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Recursively sort object keys so serialization is order-independent.
fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(entries) => {
            serde_json::Value::Array(entries.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// SHA-256 hex digest of a value's canonical JSON form.
pub fn canonical_digest<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value)?;
    let canonical = serde_json::to_string(&sort_keys(&json))?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
