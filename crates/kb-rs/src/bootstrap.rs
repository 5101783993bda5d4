//! Startup wiring from config to an opened knowledge base.

use kb_rs_config::{EmbeddingConfig, FASTEMBED_PROVIDER, HASHING_PROVIDER, KbConfig};
use kb_rs_memory::{
    BulkLoader, Embedder, EmbeddingError, FastEmbedder, HashingEmbedder, IndexError, LoadOutcome,
    LocalEmbeddingIndex, MemoryError, MemoryStore, SkipReason,
};
use kb_rs_tools::{ToolContext, ToolRegistry, builtin_tool_registry};
use log::info;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors raised while opening the knowledge base.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The configured embedding provider cannot be constructed.
    #[error("unsupported embedding provider: {0}")]
    UnsupportedEmbedding(String),
    /// The embedding model could not be loaded.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// The index could not be opened.
    #[error("failed to open knowledge base at {path}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: IndexError,
    },
}

/// Directory under the store path that holds downloaded model files.
const MODEL_CACHE_DIR: &str = "models";

/// Build the embedder named by the config. Model files are cached under `cache_dir`.
pub fn embedder_for(
    config: &EmbeddingConfig,
    cache_dir: &Path,
) -> Result<Arc<dyn Embedder>, BootstrapError> {
    match config.provider.as_str() {
        FASTEMBED_PROVIDER => Ok(Arc::new(FastEmbedder::new(cache_dir)?)),
        HASHING_PROVIDER => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        other => Err(BootstrapError::UnsupportedEmbedding(other.to_string())),
    }
}

/// An opened store together with the tools that serve it.
#[derive(Clone)]
pub struct KnowledgeBase {
    store: MemoryStore,
    registry: ToolRegistry,
    seed_file: Option<PathBuf>,
}

impl KnowledgeBase {
    /// Open the configured collection. Relative paths resolve against `base`.
    pub async fn open(config: &KbConfig, base: &Path) -> Result<Self, BootstrapError> {
        let dir = config.store_dir(base);
        let embedding = config.embedding.clone();
        let cache_dir = dir.join(MODEL_CACHE_DIR);
        // Model loading blocks on disk and network.
        let embedder = tokio::task::spawn_blocking(move || embedder_for(&embedding, &cache_dir))
            .await
            .map_err(|err| EmbeddingError::Load(err.to_string()))??;
        let index = LocalEmbeddingIndex::open(&dir, &config.store.collection, embedder)
            .await
            .map_err(|source| BootstrapError::Index {
                path: dir.clone(),
                source,
            })?;
        info!(
            "knowledge base initialized (path={}, collection={})",
            dir.display(),
            config.store.collection
        );
        Ok(Self {
            store: MemoryStore::open(Arc::new(index)),
            registry: builtin_tool_registry(),
            seed_file: config.seed_file(base),
        })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Configured seed file, if any.
    pub fn seed_file(&self) -> Option<&Path> {
        self.seed_file.as_deref()
    }

    /// Ingest the configured seed file once. Without one this is a skip.
    pub async fn load_seed(&self) -> Result<LoadOutcome, MemoryError> {
        match &self.seed_file {
            Some(path) => self.load_file(path).await,
            None => Ok(LoadOutcome::Skipped(SkipReason::FileMissing)),
        }
    }

    /// Ingest an explicit seed file, subject to the same dedup guard.
    pub async fn load_file(&self, path: &Path) -> Result<LoadOutcome, MemoryError> {
        BulkLoader::new(self.store.clone()).load(path).await
    }

    /// Run a tool against this knowledge base and return its text.
    pub async fn invoke(&self, tool: &str, args: Value) -> String {
        let ctx = ToolContext::new(self.store.clone());
        self.registry.invoke(tool, &ctx, args).await
    }
}
