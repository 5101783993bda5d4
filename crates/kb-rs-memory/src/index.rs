//! Embedding index interface and the local disk-backed implementation.

use crate::embedding::{Embedder, EmbeddingError, cosine_distance};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Errors returned by embedding index implementations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The embedder failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// An entry with the same id already exists.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// Persisted state could not be interpreted.
    #[error("corrupt collection {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Conjunction of exact-equality constraints on top-level metadata keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    clauses: Vec<(String, Value)>,
}

impl MetadataFilter {
    /// Create an empty filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((key.into(), value.into()));
        self
    }

    /// Whether the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check a metadata object against every clause.
    pub fn matches(&self, metadata: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// One stored document with its metadata and embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Entry identifier.
    pub id: String,
    /// Original document text.
    pub document: String,
    /// Metadata object.
    pub metadata: Value,
    /// Embedding vector for the document.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Model that produced `embedding`.
    #[serde(default)]
    pub model: String,
}

/// A nearest-neighbor result.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Entry identifier.
    pub id: String,
    /// Original document text.
    pub document: String,
    /// Metadata object.
    pub metadata: Value,
    /// Distance from the query embedding.
    pub distance: f32,
}

/// Exact or filtered retrieval request without ranking.
#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    /// Restrict to these ids when present.
    pub ids: Option<Vec<String>>,
    /// Restrict to entries whose metadata matches.
    pub filter: Option<MetadataFilter>,
    /// Maximum number of entries to return.
    pub limit: Option<usize>,
}

impl GetRequest {
    /// Request every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Request specific ids.
    pub fn ids(ids: Vec<String>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Request entries matching a filter.
    pub fn filtered(filter: MetadataFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Cap the number of returned entries.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, entry: &IndexEntry) -> bool {
        let id_ok = self
            .ids
            .as_ref()
            .is_none_or(|ids| ids.iter().any(|id| id == &entry.id));
        let filter_ok = self
            .filter
            .as_ref()
            .is_none_or(|filter| filter.matches(&entry.metadata));
        id_ok && filter_ok
    }
}

#[async_trait]
/// Embedding and nearest-neighbor substrate used by the memory store.
pub trait EmbeddingIndex: Send + Sync {
    /// Embed and persist a document under `id`.
    async fn add(&self, id: &str, document: &str, metadata: Value) -> Result<(), IndexError>;

    /// Return up to `k` entries nearest to `text`, closest first.
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError>;

    /// Return entries in native order without ranking.
    async fn get(&self, request: GetRequest) -> Result<Vec<IndexEntry>, IndexError>;

    /// Replace the metadata of an existing entry. Returns false if absent.
    async fn update_metadata(&self, id: &str, metadata: Value) -> Result<bool, IndexError>;

    /// Delete entries by id, returning how many were removed.
    async fn delete(&self, ids: &[String]) -> Result<usize, IndexError>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize, IndexError>;
}

/// Disk-backed index storing one JSON entry per line.
pub struct LocalEmbeddingIndex {
    /// Collection file path.
    path: PathBuf,
    /// Embedder for documents and queries.
    embedder: Arc<dyn Embedder>,
    /// Entries in insertion order.
    entries: RwLock<Vec<IndexEntry>>,
}

impl std::fmt::Debug for LocalEmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbeddingIndex")
            .field("path", &self.path)
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

impl LocalEmbeddingIndex {
    /// Create or open the named collection under `root`.
    pub async fn open(
        root: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        let path = root.join(format!("{collection}.jsonl"));
        let mut entries = load_entries(&path).await?;

        let dimensions = embedder.dimensions();
        let model = embedder.model_name().to_string();
        let mut reembedded = 0usize;
        for entry in entries.iter_mut() {
            if entry.embedding.len() != dimensions || entry.model != model {
                entry.embedding = embedder.embed(&entry.document)?;
                entry.model = model.clone();
                reembedded += 1;
            }
        }
        if reembedded > 0 {
            warn!(
                "re-embedded entries from another model (count={}, model={}, dimensions={})",
                reembedded, model, dimensions
            );
            write_entries(&path, &entries).await?;
        }

        info!(
            "opened embedding index (path={}, entries={}, model={})",
            path.display(),
            entries.len(),
            embedder.model_name()
        );
        Ok(Self {
            path,
            embedder,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EmbeddingIndex for LocalEmbeddingIndex {
    async fn add(&self, id: &str, document: &str, metadata: Value) -> Result<(), IndexError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|entry| entry.id == id) {
            return Err(IndexError::DuplicateId(id.to_string()));
        }
        let entry = IndexEntry {
            id: id.to_string(),
            document: document.to_string(),
            metadata,
            embedding: self.embedder.embed(document)?,
            model: self.embedder.model_name().to_string(),
        };
        append_entry(&self.path, &entry).await?;
        entries.push(entry);
        debug!("indexed entry (id={}, document_len={})", id, document.len());
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(text)?;
        let entries = self.entries.read().await;
        let mut hits: Vec<IndexHit> = entries
            .iter()
            .filter(|entry| filter.is_none_or(|filter| filter.matches(&entry.metadata)))
            .map(|entry| IndexHit {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: cosine_distance(&query_embedding, &entry.embedding),
            })
            .collect();
        // Stable sort keeps insertion order between equal distances.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        debug!("index query (k={}, returned={})", k, hits.len());
        Ok(hits)
    }

    async fn get(&self, request: GetRequest) -> Result<Vec<IndexEntry>, IndexError> {
        let entries = self.entries.read().await;
        let limit = request.limit.unwrap_or(usize::MAX);
        Ok(entries
            .iter()
            .filter(|entry| request.matches(entry))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_metadata(&self, id: &str, metadata: Value) -> Result<bool, IndexError> {
        let mut entries = self.entries.write().await;
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return Ok(false);
        };
        let mut next = entries.clone();
        next[position].metadata = metadata;
        write_entries(&self.path, &next).await?;
        *entries = next;
        Ok(true)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, IndexError> {
        let mut entries = self.entries.write().await;
        let next: Vec<IndexEntry> = entries
            .iter()
            .filter(|entry| !ids.contains(&entry.id))
            .cloned()
            .collect();
        let removed = entries.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }
        write_entries(&self.path, &next).await?;
        *entries = next;
        debug!("deleted index entries (removed={})", removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().await.len())
    }
}

/// Load all entries from a collection file.
async fn load_entries(path: &Path) -> Result<Vec<IndexEntry>, IndexError> {
    if !fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).await?;
    let mut entries = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: IndexEntry =
            serde_json::from_str(line).map_err(|err| IndexError::Corrupt {
                path: path.display().to_string(),
                message: format!("line {}: {err}", line_no + 1),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Append a single entry to the collection file.
async fn append_entry(path: &Path, entry: &IndexEntry) -> Result<(), IndexError> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Rewrite the collection file atomically.
async fn write_entries(path: &Path, entries: &[IndexEntry]) -> Result<(), IndexError> {
    let temp_path = path.with_extension("jsonl.tmp");
    let mut contents = String::new();
    for entry in entries {
        contents.push_str(&serde_json::to_string(entry)?);
        contents.push('\n');
    }
    fs::write(&temp_path, contents).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EmbeddingIndex, GetRequest, IndexError, LocalEmbeddingIndex, MetadataFilter};
    use crate::embedding::{Embedder, EmbeddingError, HashingEmbedder};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn open_index(root: &std::path::Path) -> LocalEmbeddingIndex {
        LocalEmbeddingIndex::open(root, "test", Arc::new(HashingEmbedder::new(64)))
            .await
            .expect("open index")
    }

    #[test]
    fn filter_requires_every_clause() {
        let filter = MetadataFilter::new()
            .with("memory_type", "environment")
            .with("source", "initial_knowledge");
        assert!(filter.matches(&json!({
            "memory_type": "environment",
            "source": "initial_knowledge"
        })));
        assert!(!filter.matches(&json!({ "memory_type": "environment" })));
        assert!(MetadataFilter::new().matches(&json!({})));
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let temp = tempdir().expect("tempdir");
        {
            let index = open_index(temp.path()).await;
            index
                .add("a", "redis cache notes", json!({ "n": 1 }))
                .await
                .expect("add a");
            index
                .add("b", "grafana dashboard", json!({ "n": 2 }))
                .await
                .expect("add b");
            index
                .update_metadata("a", json!({ "n": 10 }))
                .await
                .expect("update");
        }

        let index = open_index(temp.path()).await;
        let entries = index.get(GetRequest::all()).await.expect("get");
        let ids: Vec<_> = entries.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(entries[0].metadata, json!({ "n": 10 }));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let temp = tempdir().expect("tempdir");
        let index = open_index(temp.path()).await;
        index.add("a", "one", json!({})).await.expect("add");
        let err = index.add("a", "two", json!({})).await.expect_err("dup");
        assert!(matches!(err, IndexError::DuplicateId(id) if id == "a"));
        assert_eq!(index.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_distance_and_honors_filter() {
        let temp = tempdir().expect("tempdir");
        let index = open_index(temp.path()).await;
        index
            .add("logs", "splunk application logs", json!({ "kind": "env" }))
            .await
            .expect("add");
        index
            .add("code", "graphql mutation test", json!({ "kind": "code" }))
            .await
            .expect("add");

        let hits = index.query("splunk logs", 2, None).await.expect("query");
        assert_eq!(hits[0].id, "logs");
        assert!(hits[0].distance <= hits[1].distance);

        let filter = MetadataFilter::new().with("kind", "code");
        let hits = index
            .query("splunk logs", 5, Some(&filter))
            .await
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "code");

        assert!(index.query("anything", 0, None).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn delete_and_limits() {
        let temp = tempdir().expect("tempdir");
        let index = open_index(temp.path()).await;
        for n in 0..4 {
            index
                .add(&format!("id-{n}"), "text", json!({ "n": n }))
                .await
                .expect("add");
        }
        let limited = index
            .get(GetRequest::all().with_limit(2))
            .await
            .expect("get");
        assert_eq!(limited.len(), 2);

        let removed = index
            .delete(&["id-1".to_string(), "missing".to_string()])
            .await
            .expect("delete");
        assert_eq!(removed, 1);
        let by_id = index
            .get(GetRequest::ids(vec!["id-1".to_string()]))
            .await
            .expect("get");
        assert!(by_id.is_empty());
        assert_eq!(index.count().await.expect("count"), 3);
    }

    #[tokio::test]
    async fn corrupt_lines_fail_open() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("test.jsonl"), "not json\n").expect("write");
        let err = LocalEmbeddingIndex::open(temp.path(), "test", Arc::new(HashingEmbedder::new(8)))
            .await
            .expect_err("corrupt");
        assert!(matches!(err, IndexError::Corrupt { .. }));
    }

    /// Switching embedders re-embeds stored entries so distances stay comparable.
    #[tokio::test]
    async fn reopening_with_another_model_reembeds() {
        struct ConstantEmbedder;
        impl Embedder for ConstantEmbedder {
            fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Ok(vec![1.0; 64])
            }
            fn model_name(&self) -> &str {
                "constant"
            }
            fn dimensions(&self) -> usize {
                64
            }
        }

        let temp = tempdir().expect("tempdir");
        {
            let index =
                LocalEmbeddingIndex::open(temp.path(), "test", Arc::new(ConstantEmbedder))
                    .await
                    .expect("open");
            index.add("a", "redis cache", json!({})).await.expect("add");
        }

        let index = open_index(temp.path()).await;
        let entries = index.get(GetRequest::all()).await.expect("get");
        assert_eq!(entries[0].model, "hashing-fnv1a");
        assert_eq!(
            entries[0].embedding,
            HashingEmbedder::new(64).embed("redis cache").expect("embed")
        );
    }

    #[tokio::test]
    async fn embedder_failures_surface_as_index_errors() {
        struct BrokenEmbedder;
        impl Embedder for BrokenEmbedder {
            fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Err(EmbeddingError::Inference("no session".to_string()))
            }
            fn model_name(&self) -> &str {
                "broken"
            }
            fn dimensions(&self) -> usize {
                8
            }
        }

        let temp = tempdir().expect("tempdir");
        let index = LocalEmbeddingIndex::open(temp.path(), "test", Arc::new(BrokenEmbedder))
            .await
            .expect("open");
        let err = index.add("a", "text", json!({})).await.expect_err("add");
        assert!(matches!(err, IndexError::Embedding(_)));
        assert_eq!(index.count().await.expect("count"), 0);
    }
}
