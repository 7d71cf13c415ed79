//! Store error types for shapegraph-store.
//!
//! [`StoreError`] covers the persistence collaborator's failure modes:
//! payload serialization, transport failures, and outright rejection.

use thiserror::Error;

/// Errors produced by persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The collaborator could not be reached or the call timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The collaborator refused the payload.
    #[error("persist rejected: {0}")]
    Rejected(String),
}
