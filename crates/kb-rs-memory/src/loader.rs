//! One-time ingestion of a plain-text seed file.

use crate::error::MemoryError;
use crate::extract::extract_metadata;
use crate::index::IndexError;
use crate::model::INITIAL_KNOWLEDGE_SOURCE;
use crate::store::MemoryStore;
use log::{info, warn};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use uuid::Uuid;

static ENTRY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("entry separator is valid"));

/// Why a load did not ingest anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StoreUninitialized,
    FileMissing,
    AlreadyLoaded,
}

/// Result of a [`BulkLoader::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Skipped(SkipReason),
    Loaded { loaded: usize, failed: usize },
}

impl LoadOutcome {
    /// Number of entries persisted by this call.
    pub fn loaded(&self) -> usize {
        match self {
            LoadOutcome::Skipped(_) => 0,
            LoadOutcome::Loaded { loaded, .. } => *loaded,
        }
    }
}

/// Split seed file content into trimmed, non-empty entries.
pub fn split_entries(content: &str) -> Vec<&str> {
    ENTRY_SEPARATOR
        .split(content)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Loads seed entries into a store at most once.
#[derive(Debug, Clone)]
pub struct BulkLoader {
    store: MemoryStore,
}

impl BulkLoader {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Ingest `path` unless the store is closed, the file is missing, or a
    /// previous load already stamped records with the seed marker.
    ///
    /// Per-entry failures are logged and counted; they never abort the load.
    pub async fn load(&self, path: &Path) -> Result<LoadOutcome, MemoryError> {
        if !self.store.is_open() {
            info!("skipping seed load, store not initialized");
            return Ok(LoadOutcome::Skipped(SkipReason::StoreUninitialized));
        }
        if !tokio::fs::try_exists(path)
            .await
            .map_err(IndexError::from)?
        {
            info!("skipping seed load, file not found (path={})", path.display());
            return Ok(LoadOutcome::Skipped(SkipReason::FileMissing));
        }
        if self.store.has_initial_knowledge().await? {
            info!("skipping seed load, already loaded (path={})", path.display());
            return Ok(LoadOutcome::Skipped(SkipReason::AlreadyLoaded));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(IndexError::from)?
            .replace("\r\n", "\n");

        let mut loaded = 0;
        let mut failed = 0;
        for (position, entry) in split_entries(&content).into_iter().enumerate() {
            let id = seed_id(position);
            let mut metadata = extract_metadata(entry);
            metadata.source = Some(INITIAL_KNOWLEDGE_SOURCE.to_string());
            metadata.initial_load = Some(true);
            match self.store.insert(&id, entry, &metadata).await {
                Ok(()) => loaded += 1,
                Err(err) => {
                    failed += 1;
                    warn!("failed to load seed entry (position={position}, error={err})");
                }
            }
        }
        info!(
            "seed load finished (path={}, loaded={}, failed={})",
            path.display(),
            loaded,
            failed
        );
        Ok(LoadOutcome::Loaded { loaded, failed })
    }
}

fn seed_id(position: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("initial_{position}_{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::{seed_id, split_entries};
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_blank_lines_and_drops_empty_entries() {
        let content = "first entry\nstill first\n\n\n  \nsecond entry\n   \n\nthird\n\n";
        assert_eq!(
            split_entries(content),
            vec!["first entry\nstill first", "second entry", "third"]
        );
    }

    #[test]
    fn whitespace_only_content_has_no_entries() {
        assert!(split_entries("\n\n   \n\t\n").is_empty());
    }

    #[test]
    fn seed_ids_carry_position_and_random_suffix() {
        let id = seed_id(3);
        assert!(id.starts_with("initial_3_"));
        assert_eq!(id.len(), "initial_3_".len() + 8);
        assert_ne!(seed_id(3), id);
    }
}
