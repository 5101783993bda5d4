//! Search ranking with the sentence encoder.

use kb_rs_memory::{FastEmbedder, LocalEmbeddingIndex, MemoryStore, QueryEngine};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

/// A memory related by meaning outranks an unrelated one even when neither
/// shares a word with the query.
#[tokio::test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
async fn related_memory_ranks_first_without_shared_words() {
    let temp = tempdir().expect("tempdir");
    let embedder = FastEmbedder::new(temp.path().join("models")).expect("load model");
    let index = LocalEmbeddingIndex::open(temp.path().join("data"), "kb", Arc::new(embedder))
        .await
        .expect("open index");
    let store = MemoryStore::open(Arc::new(index));
    store
        .save("team lunch is on fridays", None, None)
        .await
        .expect("save lunch");
    store
        .save("postgresql connection pool exhausted under load", None, None)
        .await
        .expect("save postgres");

    let hits = QueryEngine::new(store)
        .search("database outage", 2, None)
        .await
        .expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(
        hits[0].record.content,
        "postgresql connection pool exhausted under load"
    );
    assert!(hits[0].similarity > hits[1].similarity);
    assert!(hits[0].similarity > 0.0);
}
