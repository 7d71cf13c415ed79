//! The [`ContentStore`] trait defining the persistence contract.
//!
//! The geometry engine persists two things: single vertices (capture) and
//! the edge-list snapshot of a whole graph (commit). Both are network-bound
//! in production, so the contract is async. All backends ([`InMemoryStore`],
//! [`HttpStore`]) implement this trait, ensuring they are fully swappable
//! without changing engine logic.
//!
//! [`InMemoryStore`]: crate::memory::InMemoryStore
//! [`HttpStore`]: crate::http::HttpStore

use async_trait::async_trait;
use serde_json::Value;

use shapegraph_core::ContentHash;

use crate::error::StoreError;
use crate::types::GraphSnapshot;

/// The persistence contract for the geometry engine.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persists one vertex's canonical representation and returns its
    /// content identifier.
    ///
    /// Equal content yields equal identifiers; deduplication of repeated
    /// content happens behind this call.
    async fn persist_vertex(&self, content: &Value) -> Result<ContentHash, StoreError>;

    /// Persists the edge-list snapshot of a whole graph.
    async fn persist_snapshot(&self, snapshot: &GraphSnapshot) -> Result<(), StoreError>;
}
