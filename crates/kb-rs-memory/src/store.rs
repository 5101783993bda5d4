//! Memory record lifecycle on top of an embedding index.

use crate::error::{MAX_AMBIGUOUS_CANDIDATES, MemoryError};
use crate::extract::{apply_type_override, extract_metadata};
use crate::index::{EmbeddingIndex, GetRequest, IndexEntry, MetadataFilter};
use crate::model::{INITIAL_KNOWLEDGE_SOURCE, MemoryMetadata, MemoryRecord, MemoryType};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound applied to every list request.
pub const MAX_LIST_LIMIT: usize = 50;
/// Characters kept when listing without full content.
pub const LIST_PREVIEW_CHARS: usize = 100;

/// Changes applied by [`MemoryStore::update`].
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    /// Replacement content.
    pub content: String,
    /// Explicit classification; `None` keeps the re-extracted one.
    pub memory_type: Option<MemoryType>,
    /// Replacement tags; `None` keeps the existing tags.
    pub tags: Option<Vec<String>>,
}

/// Owns memory records stored in an embedding index.
///
/// Cloning is cheap; clones share the same index.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Opened index, `None` until the store is opened.
    index: Option<Arc<dyn EmbeddingIndex>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("opened", &self.index.is_some())
            .finish()
    }
}

impl MemoryStore {
    /// Wrap an opened index.
    pub fn open(index: Arc<dyn EmbeddingIndex>) -> Self {
        Self { index: Some(index) }
    }

    /// A store with no index; every operation fails with `StoreUninitialized`.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether an index is attached.
    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    fn index(&self) -> Result<&Arc<dyn EmbeddingIndex>, MemoryError> {
        self.index.as_ref().ok_or(MemoryError::StoreUninitialized)
    }

    /// Persist content under a freshly generated id.
    pub async fn create(
        &self,
        content: &str,
        metadata: &MemoryMetadata,
    ) -> Result<String, MemoryError> {
        self.index()?;
        let id = Uuid::new_v4().to_string();
        self.insert(&id, content, metadata).await?;
        Ok(id)
    }

    /// Persist content under a caller-chosen id.
    pub async fn insert(
        &self,
        id: &str,
        content: &str,
        metadata: &MemoryMetadata,
    ) -> Result<(), MemoryError> {
        let index = self.index()?;
        index.add(id, content, metadata.to_value()?).await?;
        debug!(
            "stored memory (id={}, type={}, content_len={})",
            id,
            metadata.memory_type,
            content.len()
        );
        Ok(())
    }

    /// Classify and persist new content.
    ///
    /// `memory_type` overrides the automatic classification only when it
    /// names one of the specific types; anything else is ignored.
    pub async fn save(
        &self,
        content: &str,
        memory_type: Option<&str>,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryRecord, MemoryError> {
        self.index()?;
        let mut metadata = extract_metadata(content);
        apply_type_override(&mut metadata, memory_type);
        if let Some(tags) = tags {
            metadata.tags = tags;
        }
        let id = self.create(content, &metadata).await?;
        info!(
            "memory saved (id={}, type={}, technologies={})",
            id,
            metadata.memory_type,
            metadata.technologies.len()
        );
        Ok(MemoryRecord {
            id,
            content: content.to_string(),
            metadata,
        })
    }

    /// Fetch a record by exact id. Does not count as an access.
    pub async fn get(&self, id: &str) -> Result<MemoryRecord, MemoryError> {
        let index = self.index()?;
        let entry = index
            .get(GetRequest::ids(vec![id.to_string()]).with_limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;
        record_from_entry(entry)
    }

    /// Resolve a partial id by case-insensitive substring match over all ids.
    ///
    /// Scans every stored id. Zero matches is `NotFound`, more than one is
    /// `AmbiguousMatch` with up to five candidates.
    pub async fn get_by_prefix(&self, partial_id: &str) -> Result<MemoryRecord, MemoryError> {
        let index = self.index()?;
        let needle = partial_id.to_lowercase();
        let mut matches: Vec<IndexEntry> = index
            .get(GetRequest::all())
            .await?
            .into_iter()
            .filter(|entry| entry.id.to_lowercase().contains(&needle))
            .collect();

        match matches.len() {
            0 => Err(MemoryError::NotFound(partial_id.to_string())),
            1 => record_from_entry(matches.remove(0)),
            _ => Err(MemoryError::AmbiguousMatch {
                query: partial_id.to_string(),
                candidates: matches
                    .into_iter()
                    .take(MAX_AMBIGUOUS_CANDIDATES)
                    .map(|entry| entry.id)
                    .collect(),
            }),
        }
    }

    /// Hard delete by exact id.
    pub async fn delete(&self, id: &str) -> Result<(), MemoryError> {
        let index = self.index()?;
        let removed = index.delete(&[id.to_string()]).await?;
        if removed == 0 {
            return Err(MemoryError::NotFound(id.to_string()));
        }
        info!("memory deleted (id={})", id);
        Ok(())
    }

    /// Resolve a partial id and delete exactly that record.
    pub async fn delete_by_prefix(&self, partial_id: &str) -> Result<String, MemoryError> {
        let record = self.get_by_prefix(partial_id).await?;
        self.delete(&record.id).await?;
        Ok(record.id)
    }

    /// Replace a record's content, keeping its id, creation time and access count.
    pub async fn update(
        &self,
        id: &str,
        update: MemoryUpdate,
    ) -> Result<MemoryRecord, MemoryError> {
        let existing = self.get(id).await?;

        let mut metadata = extract_metadata(&update.content);
        if let Some(memory_type) = update.memory_type {
            metadata.memory_type = memory_type;
        }
        metadata.tags = update.tags.unwrap_or_else(|| existing.metadata.tags.clone());
        metadata.created_at = existing.metadata.created_at;
        metadata.access_count = existing.metadata.access_count;
        metadata.source = existing.metadata.source.clone();
        metadata.initial_load = existing.metadata.initial_load;

        self.delete(id).await?;
        if let Err(err) = self.insert(id, &update.content, &metadata).await {
            warn!("memory update failed, restoring previous content (id={id}, error={err})");
            if let Err(restore_err) = self
                .insert(id, &existing.content, &existing.metadata)
                .await
            {
                warn!("failed to restore memory (id={id}, error={restore_err})");
            }
            return Err(err);
        }
        info!("memory updated (id={}, type={})", id, metadata.memory_type);
        Ok(MemoryRecord {
            id: id.to_string(),
            content: update.content,
            metadata,
        })
    }

    /// List records in native order, optionally restricted to one type.
    ///
    /// `limit` is clamped to [`MAX_LIST_LIMIT`]. Without full content the
    /// returned records carry a preview of their content.
    pub async fn list(
        &self,
        filter_by_type: Option<MemoryType>,
        limit: usize,
        include_full_content: bool,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let index = self.index()?;
        let mut request = GetRequest::all().with_limit(limit.min(MAX_LIST_LIMIT));
        if let Some(memory_type) = filter_by_type {
            request.filter = Some(type_filter(memory_type));
        }
        let entries = index.get(request).await?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut record = record_from_entry(entry)?;
            if !include_full_content {
                record.content = record.preview(LIST_PREVIEW_CHARS);
            }
            records.push(record);
        }
        debug!("listed memories (returned={})", records.len());
        Ok(records)
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.index()?.count().await?)
    }

    /// Whether at least one record came from the seed file.
    pub async fn has_initial_knowledge(&self) -> Result<bool, MemoryError> {
        let index = self.index()?;
        let filter = MetadataFilter::new().with("source", INITIAL_KNOWLEDGE_SOURCE);
        let existing = index
            .get(GetRequest::filtered(filter).with_limit(1))
            .await?;
        Ok(!existing.is_empty())
    }

    /// Persist updated metadata for an existing record.
    pub(crate) async fn write_metadata(
        &self,
        id: &str,
        metadata: &MemoryMetadata,
    ) -> Result<(), MemoryError> {
        let index = self.index()?;
        if index.update_metadata(id, metadata.to_value()?).await? {
            Ok(())
        } else {
            Err(MemoryError::NotFound(id.to_string()))
        }
    }

    pub(crate) fn index_handle(&self) -> Result<Arc<dyn EmbeddingIndex>, MemoryError> {
        self.index().cloned()
    }
}

/// Metadata filter selecting one memory type.
pub(crate) fn type_filter(memory_type: MemoryType) -> MetadataFilter {
    MetadataFilter::new().with("memory_type", memory_type.as_str())
}

/// Decode a raw index entry into a memory record.
pub(crate) fn record_from_entry(entry: IndexEntry) -> Result<MemoryRecord, MemoryError> {
    Ok(MemoryRecord {
        id: entry.id,
        content: entry.document,
        metadata: MemoryMetadata::from_value(entry.metadata)?,
    })
}
