//! Semantic search over the memory store.

use crate::error::MemoryError;
use crate::model::{MemoryMetadata, MemoryRecord, MemoryType};
use crate::store::{MemoryStore, type_filter};
use chrono::Utc;
use log::{debug, warn};

/// Upper bound applied to every search request.
pub const MAX_SEARCH_LIMIT: usize = 10;

const DISTANCE_TOLERANCE: f32 = 1e-4;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: MemoryRecord,
    /// Raw distance reported by the index.
    pub distance: f32,
    /// `1 - distance`, reported unclamped.
    pub similarity: f32,
}

/// Ranks stored memories against a query and records access bookkeeping.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: MemoryStore,
}

impl QueryEngine {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Nearest records to `query`, closest first.
    ///
    /// `limit` is clamped to [`MAX_SEARCH_LIMIT`]. Every returned hit has its
    /// access count bumped; failures to persist that are logged and the hit
    /// is returned with its stored metadata.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filter_by_type: Option<MemoryType>,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        let index = self.store.index_handle()?;
        let limit = limit.min(MAX_SEARCH_LIMIT);
        let filter = filter_by_type.map(type_filter);
        let raw_hits = index.query(query, limit, filter.as_ref()).await?;

        let now = Utc::now();
        let mut hits = Vec::with_capacity(raw_hits.len());
        for raw in raw_hits {
            let similarity = 1.0 - raw.distance;
            if !(-DISTANCE_TOLERANCE..=1.0 + DISTANCE_TOLERANCE).contains(&raw.distance) {
                warn!(
                    "index distance outside [0, 1], similarity is not meaningful (id={}, distance={})",
                    raw.id, raw.distance
                );
            }
            let mut metadata = MemoryMetadata::from_value(raw.metadata)?;
            let original = metadata.clone();
            metadata.touch(now);
            let metadata = match self.store.write_metadata(&raw.id, &metadata).await {
                Ok(()) => metadata,
                Err(err) => {
                    warn!("failed to record memory access (id={}, error={})", raw.id, err);
                    original
                }
            };
            hits.push(SearchHit {
                record: MemoryRecord {
                    id: raw.id,
                    content: raw.document,
                    metadata,
                },
                distance: raw.distance,
                similarity,
            });
        }
        debug!(
            "search completed (limit={}, filter={:?}, hits={})",
            limit,
            filter_by_type,
            hits.len()
        );
        Ok(hits)
    }
}
