use async_trait::async_trait;
use kb_rs_memory::{
    EmbeddingIndex, GetRequest, HashingEmbedder, IndexEntry, IndexError, IndexHit,
    LocalEmbeddingIndex, MemoryStore, MetadataFilter,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

/// Open a store backed by a fresh local index in a temporary directory.
pub async fn open_temp_store() -> (TempDir, MemoryStore) {
    let temp = tempfile::tempdir().expect("tempdir");
    let index = LocalEmbeddingIndex::open(
        temp.path(),
        "knowledge_base",
        Arc::new(HashingEmbedder::default()),
    )
    .await
    .expect("open index");
    (temp, MemoryStore::open(Arc::new(index)))
}

fn injected(operation: &str) -> IndexError {
    IndexError::Io(std::io::Error::other(format!("injected {operation} failure")))
}

/// Index whose every operation fails.
#[derive(Debug, Clone, Default)]
pub struct FailingIndex;

#[async_trait]
impl EmbeddingIndex for FailingIndex {
    async fn add(&self, _id: &str, _document: &str, _metadata: Value) -> Result<(), IndexError> {
        Err(injected("add"))
    }

    async fn query(
        &self,
        _text: &str,
        _k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        Err(injected("query"))
    }

    async fn get(&self, _request: GetRequest) -> Result<Vec<IndexEntry>, IndexError> {
        Err(injected("get"))
    }

    async fn update_metadata(&self, _id: &str, _metadata: Value) -> Result<bool, IndexError> {
        Err(injected("update"))
    }

    async fn delete(&self, _ids: &[String]) -> Result<usize, IndexError> {
        Err(injected("delete"))
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Err(injected("count"))
    }
}

/// Wraps a real index and fails selected operations on demand.
#[derive(Clone)]
pub struct FlakyIndex {
    inner: Arc<dyn EmbeddingIndex>,
    fail_metadata_updates: Arc<AtomicBool>,
    fail_adds_containing: Arc<Mutex<Option<String>>>,
}

impl FlakyIndex {
    pub fn new(inner: Arc<dyn EmbeddingIndex>) -> Self {
        Self {
            inner,
            fail_metadata_updates: Arc::new(AtomicBool::new(false)),
            fail_adds_containing: Arc::new(Mutex::new(None)),
        }
    }

    /// Make `update_metadata` fail until reset.
    pub fn fail_metadata_updates(&self, fail: bool) {
        self.fail_metadata_updates.store(fail, Ordering::SeqCst);
    }

    /// Make `add` fail for documents containing `needle`.
    pub fn fail_adds_containing(&self, needle: Option<&str>) {
        *self.fail_adds_containing.lock() = needle.map(str::to_string);
    }
}

#[async_trait]
impl EmbeddingIndex for FlakyIndex {
    async fn add(&self, id: &str, document: &str, metadata: Value) -> Result<(), IndexError> {
        let should_fail = self
            .fail_adds_containing
            .lock()
            .as_deref()
            .is_some_and(|needle| document.contains(needle));
        if should_fail {
            return Err(injected("add"));
        }
        self.inner.add(id, document, metadata).await
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        self.inner.query(text, k, filter).await
    }

    async fn get(&self, request: GetRequest) -> Result<Vec<IndexEntry>, IndexError> {
        self.inner.get(request).await
    }

    async fn update_metadata(&self, id: &str, metadata: Value) -> Result<bool, IndexError> {
        if self.fail_metadata_updates.load(Ordering::SeqCst) {
            return Err(injected("update"));
        }
        self.inner.update_metadata(id, metadata).await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, IndexError> {
        self.inner.delete(ids).await
    }

    async fn count(&self) -> Result<usize, IndexError> {
        self.inner.count().await
    }
}
