//! Deterministic content hashing for vertex payloads using blake3.
//!
//! The in-memory backend derives content identifiers locally the same way
//! a remote collaborator would: hash the canonical JSON bytes. Determinism
//! is ensured by `serde_json::to_vec`, which orders object keys, so equal
//! content always serializes to the same bytes and therefore the same hash.

use serde_json::Value;

use shapegraph_core::ContentHash;

use crate::error::StoreError;

/// Hashes a vertex's canonical JSON representation into its content
/// identifier.
pub fn hash_content(content: &Value) -> Result<ContentHash, StoreError> {
    let bytes = serde_json::to_vec(content)?;
    Ok(ContentHash::new(blake3::hash(&bytes).to_hex().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_deterministic() {
        let content = json!({"id": "point0", "type": "point", "origin": {"x": 1.0, "y": 2.0, "z": 0.0}});
        let a = hash_content(&content).unwrap();
        let b = hash_content(&content).unwrap();
        assert_eq!(a, b, "same content must produce the same hash");
    }

    #[test]
    fn hash_changes_on_content_change() {
        let a = hash_content(&json!({"id": "point0", "r": 10.0})).unwrap();
        let b = hash_content(&json!({"id": "point0", "r": 11.0})).unwrap();
        assert_ne!(a, b, "different content must produce different hashes");
    }

    #[test]
    fn hash_is_hex_encoded() {
        let hash = hash_content(&json!({"id": "x"})).unwrap();
        assert_eq!(hash.as_str().len(), 64);
        assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
