//! Persistent semantic memory: extraction, indexing, storage, search and seeding.

pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod loader;
pub mod model;
pub mod query;
pub mod store;

/// Embedders used by the local index.
pub use embedding::{
    DEFAULT_EMBEDDING_DIMENSIONS, Embedder, EmbeddingError, FastEmbedder, HashingEmbedder,
};
/// Memory error type.
pub use error::MemoryError;
/// Metadata extraction entry points.
pub use extract::{apply_type_override, extract_metadata};
/// Embedding index interface and local implementation.
pub use index::{
    EmbeddingIndex, GetRequest, IndexEntry, IndexError, IndexHit, LocalEmbeddingIndex,
    MetadataFilter,
};
/// Seed file ingestion.
pub use loader::{BulkLoader, LoadOutcome, SkipReason};
/// Memory record model.
pub use model::{INITIAL_KNOWLEDGE_SOURCE, MemoryMetadata, MemoryRecord, MemoryType};
/// Semantic search.
pub use query::{QueryEngine, SearchHit};
/// Record lifecycle.
pub use store::{MemoryStore, MemoryUpdate};
