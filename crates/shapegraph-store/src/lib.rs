//! Content-addressed persistence for geometry graphs.
//!
//! Provides the [`ContentStore`] trait defining the persistence contract
//! the engine captures and commits through, plus two first-class backends:
//! [`InMemoryStore`] (local blake3 hashing with dedup) and [`HttpStore`]
//! (remote design service).
//!
//! # Modules
//!
//! - [`error`]: StoreError enum with all failure modes
//! - [`types`]: GraphSnapshot, the persisted edge-list document
//! - [`traits`]: ContentStore trait definition
//! - [`hash`]: blake3 content hashing over canonical JSON
//! - [`memory`]: InMemoryStore implementation
//! - [`http`]: HttpStore implementation

pub mod error;
pub mod hash;
pub mod http;
pub mod memory;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StoreError;
pub use hash::hash_content;
pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use traits::ContentStore;
pub use types::GraphSnapshot;
