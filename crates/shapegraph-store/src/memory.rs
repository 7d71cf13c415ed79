//! In-memory implementation of [`ContentStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests, ephemeral editor
//! sessions, and anywhere a remote design service isn't needed. It derives
//! content identifiers locally with blake3 and stores payloads keyed by
//! hash, so identical content deduplicates naturally.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use shapegraph_core::ContentHash;

use crate::error::StoreError;
use crate::hash::hash_content;
use crate::traits::ContentStore;
use crate::types::GraphSnapshot;

#[derive(Debug, Default)]
struct StoreState {
    /// Persisted vertex payloads keyed by content hash.
    objects: HashMap<ContentHash, Value>,
    /// Snapshots in persist order; the last entry is the current state.
    snapshots: Vec<GraphSnapshot>,
}

/// In-memory implementation of [`ContentStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct stored objects (duplicate content collapses).
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Returns true when a payload with this hash has been persisted.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.lock().objects.contains_key(hash)
    }

    /// Returns the stored payload for a hash.
    pub fn object(&self, hash: &ContentHash) -> Option<Value> {
        self.lock().objects.get(hash).cloned()
    }

    /// Number of persisted snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.lock().snapshots.len()
    }

    /// The most recently persisted snapshot.
    pub fn latest_snapshot(&self) -> Option<GraphSnapshot> {
        self.lock().snapshots.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn persist_vertex(&self, content: &Value) -> Result<ContentHash, StoreError> {
        let hash = hash_content(content)?;
        self.lock().objects.insert(hash.clone(), content.clone());
        Ok(hash)
    }

    async fn persist_snapshot(&self, snapshot: &GraphSnapshot) -> Result<(), StoreError> {
        self.lock().snapshots.push(snapshot.clone());
        Ok(())
    }
}
