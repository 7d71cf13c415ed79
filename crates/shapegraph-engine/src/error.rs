//! Engine error types.
//!
//! Three failure kinds flow out of the engine: structural errors from the
//! underlying graph (caller error, fatal to the attempted operation),
//! persistence failures from the capture/commit protocol (abort the
//! enclosing commit, surfaced for retry or cancel), and invariant
//! violations (rejected before any mutation).

use thiserror::Error;

use shapegraph_core::{GraphError, VertexId};
use shapegraph_store::StoreError;

/// Errors produced by geometry graph operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A structural graph mutation failed (duplicate or missing vertex).
    #[error(transparent)]
    Structural(#[from] GraphError),

    /// The persistence collaborator rejected or failed a vertex capture.
    /// The enclosing commit batch was aborted; editing state is untouched.
    #[error("capture failed for {id}: {source}")]
    CaptureFailed {
        id: VertexId,
        #[source]
        source: StoreError,
    },

    /// The edge snapshot could not be persisted. The commit's graph
    /// replacements have been rolled back.
    #[error("snapshot persist failed: {source}")]
    SnapshotFailed {
        #[source]
        source: StoreError,
    },

    /// The operation would violate a graph invariant and was rejected
    /// before any mutation.
    #[error("invariant violation: {reason}")]
    InvariantViolation { reason: String },
}
