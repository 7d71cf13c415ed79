//! Core error types for shapegraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Structural
//! errors are raised synchronously at the call site and never corrupt
//! other graph state.

use thiserror::Error;

use crate::vertex::VertexId;

/// Errors produced by structural graph mutations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Attempting to add a vertex whose id is already present.
    #[error("duplicate vertex: {id}")]
    DuplicateVertex { id: VertexId },

    /// A vertex id was not found in the graph.
    #[error("vertex not found: {id}")]
    VertexNotFound { id: VertexId },
}
