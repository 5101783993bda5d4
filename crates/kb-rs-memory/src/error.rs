//! Error types for memory operations.

use crate::index::IndexError;

/// Maximum number of candidate ids carried by an ambiguous match.
pub const MAX_AMBIGUOUS_CANDIDATES: usize = 5;

/// Errors returned by the memory store, query engine, and loader.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The store was used before an index was opened.
    #[error("knowledge base not initialized")]
    StoreUninitialized,
    /// No record matched the requested id.
    #[error("no memory found with ID containing: {0}")]
    NotFound(String),
    /// More than one record matched a partial id.
    #[error("multiple memories match '{query}'")]
    AmbiguousMatch {
        /// The partial id as supplied by the caller.
        query: String,
        /// Up to `MAX_AMBIGUOUS_CANDIDATES` matching ids.
        candidates: Vec<String>,
    },
    /// Metadata extraction failed for an entry.
    #[error("metadata extraction failed: {0}")]
    Extraction(String),
    /// The embedding index failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
