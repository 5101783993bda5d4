//! Text embedding used by the local index.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Default embedding width, matching common small sentence encoders.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Errors raised while embedding text.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The model could not be loaded.
    #[error("failed to load embedding model: {0}")]
    Load(String),
    /// The model failed on an input.
    #[error("embedding failed: {0}")]
    Inference(String),
}

/// Produces fixed-width vectors for text.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    /// Model identifier recorded in logs.
    fn model_name(&self) -> &str;
    /// Vector width.
    fn dimensions(&self) -> usize;
}

/// Sentence encoder (all-MiniLM-L6-v2) run locally through ONNX.
///
/// Texts with related meaning land close together even without shared
/// words. Output vectors are unit length; cosine distance lies in [0, 2].
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Load the model, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, EmbeddingError> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.into())
            .with_show_download_progress(false);
        let model =
            TextEmbedding::try_new(options).map_err(|err| EmbeddingError::Load(err.to_string()))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &self.model_name())
            .finish()
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.model.lock();
        let mut vectors = model
            .embed(vec![text], None)
            .map_err(|err| EmbeddingError::Inference(err.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("model returned no vector".to_string()))
    }

    fn model_name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSIONS
    }
}

/// Feature-hashing embedder over lowercase alphanumeric tokens.
///
/// Only texts sharing words score as related, so this suits tests and
/// offline runs. Vectors are L2-normalised and non-negative, so cosine
/// distance is bounded in [0, 1].
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder with the given width (minimum 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for raw_token in text.split(|character: char| !character.is_alphanumeric()) {
            if raw_token.is_empty() {
                continue;
            }
            let token = raw_token.to_lowercase();
            let index = (fnv1a_hash(token.as_bytes()) % self.dimensions as u64) as usize;
            vector[index] += 1.0;
        }
        normalize(&mut vector);
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "hashing-fnv1a"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Mismatched widths or zero vectors are maximally distant.
pub fn cosine_distance(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 1.0;
    }
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|a| a * a).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|b| b * b).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 1.0;
    }
    1.0 - dot / (left_norm * right_norm)
}

fn normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for component in vector.iter_mut() {
            *component /= magnitude;
        }
    }
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::{Embedder, HashingEmbedder, cosine_distance};

    #[test]
    fn identical_text_has_zero_distance() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Restart the Dynatrace agent").expect("embed");
        let b = embedder.embed("restart the dynatrace AGENT").expect("embed");
        assert!(cosine_distance(&a, &b).abs() < 1e-5);
    }

    #[test]
    fn distance_is_bounded() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("splunk logging dashboard").expect("embed");
        let b = embedder.embed("graphql mutation test").expect("embed");
        let distance = cosine_distance(&a, &b);
        assert!((0.0..=1.0).contains(&distance));
    }

    #[test]
    fn overlapping_text_is_closer_than_unrelated() {
        let embedder = HashingEmbedder::default();
        let doc = embedder.embed("we use splunk on the cloud for application logs").expect("embed");
        let related = embedder.embed("splunk logs").expect("embed");
        let unrelated = embedder.embed("kubernetes helm chart values").expect("embed");
        assert!(cosine_distance(&doc, &related) < cosine_distance(&doc, &unrelated));
    }

    #[test]
    fn empty_text_is_maximally_distant() {
        let embedder = HashingEmbedder::new(16);
        let empty = embedder.embed("   ").expect("embed");
        let other = embedder.embed("text").expect("embed");
        assert_eq!(empty.len(), 16);
        assert_eq!(cosine_distance(&empty, &other), 1.0);
    }
}
