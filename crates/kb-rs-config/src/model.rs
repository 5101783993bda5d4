//! Configuration schema for the knowledge base.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Local sentence encoder (all-MiniLM-L6-v2 through fastembed).
pub const FASTEMBED_PROVIDER: &str = "fastembed";
/// Word-hashing embedder for offline runs and tests.
pub const HASHING_PROVIDER: &str = "hashing";
/// Output width of the fastembed model.
pub const FASTEMBED_DIMENSIONS: usize = 384;

/// Embedding providers the runtime knows how to construct.
pub const SUPPORTED_EMBEDDING_PROVIDERS: &[&str] = &[FASTEMBED_PROVIDER, HASHING_PROVIDER];

/// Root config for the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KbConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl KbConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> KbConfigBuilder {
        KbConfigBuilder::new()
    }

    /// Store directory, resolved against `base` when relative.
    pub fn store_dir(&self, base: &Path) -> PathBuf {
        resolve(base, &self.store.path)
    }

    /// Seed file, resolved against `base` when relative.
    pub fn seed_file(&self, base: &Path) -> Option<PathBuf> {
        self.seed
            .initial_file
            .as_deref()
            .map(|path| resolve(base, path))
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Builder for assembling a `KbConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct KbConfigBuilder {
    config: KbConfig,
}

impl KbConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: KbConfig::default(),
        }
    }

    /// Set the store directory.
    pub fn store_path(mut self, path: impl Into<String>) -> Self {
        self.config.store.path = path.into();
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.store.collection = collection.into();
        self
    }

    /// Set the seed file loaded at startup.
    pub fn initial_file(mut self, path: impl Into<String>) -> Self {
        self.config.seed.initial_file = Some(path.into());
        self
    }

    /// Replace the embedding configuration.
    pub fn embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.config.embedding = embedding;
        self
    }

    /// Finish building the config.
    pub fn build(self) -> KbConfig {
        self.config
    }
}

/// Where the persisted collection lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

fn default_store_path() -> String {
    "./kb_data".to_string()
}

fn default_collection() -> String {
    "knowledge_base".to_string()
}

/// Optional seed file ingested once per store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SeedConfig {
    #[serde(default)]
    pub initial_file: Option<String>,
}

/// Embedding backend selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

impl EmbeddingConfig {
    /// Word-hashing embedder of the given width.
    pub fn hashing(dimensions: usize) -> Self {
        Self {
            provider: HASHING_PROVIDER.to_string(),
            dimensions,
        }
    }
}

fn default_embedding_provider() -> String {
    FASTEMBED_PROVIDER.to_string()
}

fn default_embedding_dimensions() -> usize {
    FASTEMBED_DIMENSIONS
}
