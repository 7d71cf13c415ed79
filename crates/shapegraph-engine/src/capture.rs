//! The capture fan-out/fan-in: persist a batch of vertices concurrently
//! and assign content hashes only once every persist has succeeded.

use futures::stream::{FuturesUnordered, StreamExt};

use shapegraph_core::{ContentHash, Vertex};
use shapegraph_store::{ContentStore, StoreError};

use crate::error::EngineError;

/// Persists every vertex in the batch concurrently through `store`.
///
/// Each vertex's canonical representation is sent as an independent
/// persist call; calls may resolve in any order. Results land in
/// per-vertex placeholder slots, and completion is determined by scanning
/// the slots for still-pending entries. Hashes are assigned to the batch
/// only after the whole batch succeeded: a single failure aborts before
/// any assignment, so callers never observe a partially hashed batch.
pub(crate) async fn capture(
    store: &dyn ContentStore,
    vertices: &mut [Vertex],
) -> Result<(), EngineError> {
    let mut slots: Vec<Option<ContentHash>> = vec![None; vertices.len()];

    let mut in_flight = FuturesUnordered::new();
    for (index, vertex) in vertices.iter().enumerate() {
        let payload = vertex.canonical();
        let id = vertex.id.clone();
        in_flight.push(async move { (index, id, store.persist_vertex(&payload).await) });
    }

    while let Some((index, id, result)) = in_flight.next().await {
        match result {
            Ok(hash) => slots[index] = Some(hash),
            Err(source) => return Err(EngineError::CaptureFailed { id, source }),
        }
        if !slots.iter().any(Option::is_none) {
            break;
        }
    }

    for (vertex, slot) in vertices.iter_mut().zip(slots) {
        match slot {
            Some(hash) => vertex.content_hash = Some(hash),
            // unreachable through the loop above; never assign a partial batch
            None => {
                return Err(EngineError::CaptureFailed {
                    id: vertex.id.clone(),
                    source: StoreError::Transport(
                        "capture resolved without a content identifier".to_string(),
                    ),
                })
            }
        }
    }
    Ok(())
}
