//! Tool execution context.

use crate::ToolError;
use kb_rs_memory::{MemoryError, MemoryStore, QueryEngine};

/// Shared context passed to tools during execution.
///
/// The store is optional so a transport can keep answering while the
/// knowledge base failed to open; tools then report it as uninitialized.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    store: Option<MemoryStore>,
}

impl ToolContext {
    /// Context backed by an opened store.
    pub fn new(store: MemoryStore) -> Self {
        Self { store: Some(store) }
    }

    /// Context without a store.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// The attached store.
    pub fn store(&self) -> Result<&MemoryStore, ToolError> {
        self.store
            .as_ref()
            .ok_or(ToolError::Memory(MemoryError::StoreUninitialized))
    }

    /// Query engine over the attached store.
    pub fn query_engine(&self) -> Result<QueryEngine, ToolError> {
        Ok(QueryEngine::new(self.store()?.clone()))
    }
}
