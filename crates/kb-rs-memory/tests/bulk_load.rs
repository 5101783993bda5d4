//! Seed file ingestion integration tests.

use kb_rs_memory::{
    BulkLoader, HashingEmbedder, IndexError, LoadOutcome, LocalEmbeddingIndex, MemoryError,
    MemoryStore, MemoryType, SkipReason,
};
use kb_rs_test_utils::{FlakyIndex, open_temp_store, write_seed_file};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

const SEED: &[&str] = &[
    "Splunk dashboards live at https://x.splunkcloud.com",
    "When the gateway hangs, restart it from the ops console",
    "Team lunch is on Fridays",
];

/// Loading the same seed twice ingests it once.
#[tokio::test]
async fn second_load_is_a_no_op() {
    let (temp, store) = open_temp_store().await;
    let seed = write_seed_file(temp.path(), "seed.txt", SEED);
    let loader = BulkLoader::new(store.clone());

    let first = loader.load(&seed).await.expect("first load");
    assert_eq!(first, LoadOutcome::Loaded { loaded: 3, failed: 0 });
    assert_eq!(store.count().await.expect("count"), 3);

    let second = loader.load(&seed).await.expect("second load");
    assert_eq!(second, LoadOutcome::Skipped(SkipReason::AlreadyLoaded));
    assert_eq!(store.count().await.expect("count"), 3);
}

/// The dedup marker survives a restart.
#[tokio::test]
async fn dedup_guard_persists_across_reopen() {
    let temp = tempdir().expect("tempdir");
    let seed = write_seed_file(temp.path(), "seed.txt", SEED);
    let data = temp.path().join("kb_data");

    for expected in [
        LoadOutcome::Loaded { loaded: 3, failed: 0 },
        LoadOutcome::Skipped(SkipReason::AlreadyLoaded),
    ] {
        let index = LocalEmbeddingIndex::open(
            &data,
            "knowledge_base",
            Arc::new(HashingEmbedder::default()),
        )
        .await
        .expect("index");
        let store = MemoryStore::open(Arc::new(index));
        let outcome = BulkLoader::new(store.clone()).load(&seed).await.expect("load");
        assert_eq!(outcome, expected);
        assert_eq!(store.count().await.expect("count"), 3);
    }
}

/// Seed records carry provenance and extracted metadata.
#[tokio::test]
async fn seed_records_are_stamped() {
    let (temp, store) = open_temp_store().await;
    let seed = write_seed_file(temp.path(), "seed.txt", SEED);
    BulkLoader::new(store.clone()).load(&seed).await.expect("load");

    let records = store.list(None, 50, true).await.expect("list");
    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(record.id.starts_with("initial_"));
        assert!(record.metadata.is_initial_knowledge());
        assert_eq!(record.metadata.initial_load, Some(true));
    }
    assert_eq!(records[0].metadata.memory_type, MemoryType::Environment);
    assert_eq!(records[1].metadata.memory_type, MemoryType::Operational);
    assert_eq!(records[2].metadata.memory_type, MemoryType::General);
}

#[tokio::test]
async fn missing_file_is_skipped() {
    let (temp, store) = open_temp_store().await;
    let outcome = BulkLoader::new(store.clone())
        .load(&temp.path().join("absent.txt"))
        .await
        .expect("load");
    assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::FileMissing));
    assert_eq!(store.count().await.expect("count"), 0);
}

/// An unreadable location is an error, not a missing file.
#[tokio::test]
async fn inaccessible_path_is_an_error() {
    let (temp, store) = open_temp_store().await;
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").expect("write");

    let err = BulkLoader::new(store.clone())
        .load(&blocker.join("seed.txt"))
        .await
        .expect_err("load should fail");
    assert!(matches!(err, MemoryError::Index(IndexError::Io(_))));
    assert_eq!(store.count().await.expect("count"), 0);
}

/// Windows line endings split and classify like Unix ones.
#[tokio::test]
async fn crlf_seed_files_are_normalized() {
    let (temp, store) = open_temp_store().await;
    let seed = temp.path().join("seed.txt");
    std::fs::write(
        &seed,
        "```csharp\r\nvar client = new HttpClient();\r\n```\r\n\r\nTeam lunch is on Fridays\r\n",
    )
    .expect("write seed");

    let outcome = BulkLoader::new(store.clone()).load(&seed).await.expect("load");
    assert_eq!(outcome, LoadOutcome::Loaded { loaded: 2, failed: 0 });

    let records = store.list(None, 50, true).await.expect("list");
    assert_eq!(
        records[0].content,
        "```csharp\nvar client = new HttpClient();\n```"
    );
    assert_eq!(records[0].metadata.memory_type, MemoryType::CodeSnippet);
    assert_eq!(records[0].metadata.language, "csharp");
    assert_eq!(records[1].content, "Team lunch is on Fridays");
}

#[tokio::test]
async fn detached_store_is_skipped() {
    let temp = tempdir().expect("tempdir");
    let seed = write_seed_file(temp.path(), "seed.txt", SEED);
    let outcome = BulkLoader::new(MemoryStore::detached())
        .load(&seed)
        .await
        .expect("load");
    assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::StoreUninitialized));
}

/// One failing entry does not stop the rest.
#[tokio::test]
async fn entry_failures_do_not_abort_the_load() {
    let temp = tempdir().expect("tempdir");
    let seed = write_seed_file(temp.path(), "seed.txt", SEED);
    let local = LocalEmbeddingIndex::open(
        temp.path().join("kb_data"),
        "knowledge_base",
        Arc::new(HashingEmbedder::default()),
    )
    .await
    .expect("index");
    let flaky = FlakyIndex::new(Arc::new(local));
    flaky.fail_adds_containing(Some("gateway"));
    let store = MemoryStore::open(Arc::new(flaky));

    let outcome = BulkLoader::new(store.clone()).load(&seed).await.expect("load");
    assert_eq!(outcome, LoadOutcome::Loaded { loaded: 2, failed: 1 });
    assert_eq!(store.count().await.expect("count"), 2);
}

#[tokio::test]
async fn blank_seed_loads_nothing() {
    let (temp, store) = open_temp_store().await;
    let seed = write_seed_file(temp.path(), "seed.txt", &["  ", "\n"]);
    let outcome = BulkLoader::new(store.clone()).load(&seed).await.expect("load");
    assert_eq!(outcome.loaded(), 0);
    assert_eq!(store.count().await.expect("count"), 0);
}
