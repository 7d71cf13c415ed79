//! Storage-layer types for the persisted graph document.
//!
//! [`GraphSnapshot`] is defined here (not in shapegraph-core) because the
//! edge-list document is a persistence concern -- vertices only gain
//! content identifiers when persisted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use shapegraph_core::ContentHash;

/// The edge-list document persisted after a successful capture batch.
///
/// Maps each committed vertex's content hash to the ordered content hashes
/// of its children. Entry order follows graph insertion order so that
/// successive snapshots of the same design diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub edges: IndexMap<ContentHash, Vec<ContentHash>>,
}

impl GraphSnapshot {
    /// Number of vertex entries in the snapshot.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true when the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_keys_are_plain_hash_strings() {
        let mut snapshot = GraphSnapshot::default();
        snapshot.edges.insert(
            ContentHash::new("aa"),
            vec![ContentHash::new("bb"), ContentHash::new("cc")],
        );
        snapshot.edges.insert(ContentHash::new("bb"), vec![]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"edges":{"aa":["bb","cc"],"bb":[]}}"#);

        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn entry_order_is_preserved() {
        let mut snapshot = GraphSnapshot::default();
        snapshot.edges.insert(ContentHash::new("zz"), vec![]);
        snapshot.edges.insert(ContentHash::new("aa"), vec![]);

        let keys: Vec<&str> = snapshot.edges.keys().map(|h| h.as_str()).collect();
        assert_eq!(keys, vec!["zz", "aa"]);
    }
}
