//! Memory record model shared by the store, query engine, and loader.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provenance marker stamped on records ingested from the seed file.
pub const INITIAL_KNOWLEDGE_SOURCE: &str = "initial_knowledge";

/// Classification assigned to every memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Environment notes: hosts, dashboards, configuration.
    Environment,
    /// Content containing fenced code.
    CodeSnippet,
    /// Fixes, restarts, troubleshooting steps.
    Operational,
    /// Architecture and design decisions.
    Architectural,
    /// Anything else.
    General,
}

impl MemoryType {
    /// All variants in declaration order.
    pub const ALL: [MemoryType; 5] = [
        MemoryType::Environment,
        MemoryType::CodeSnippet,
        MemoryType::Operational,
        MemoryType::Architectural,
        MemoryType::General,
    ];

    /// Wire name used in metadata and filters.
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::Environment => "environment",
            MemoryType::CodeSnippet => "code_snippet",
            MemoryType::Operational => "operational",
            MemoryType::Architectural => "architectural",
            MemoryType::General => "general",
        }
    }

    /// Parse a caller-supplied type override.
    ///
    /// Only the four specific variants may override automatic
    /// classification; `general` and unknown names yield `None`.
    pub fn parse_override(value: &str) -> Option<MemoryType> {
        match value.parse::<MemoryType>() {
            Ok(MemoryType::General) | Err(_) => None,
            Ok(memory_type) => Some(memory_type),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a memory type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown memory type: {0}")]
pub struct UnknownMemoryType(pub String);

impl FromStr for MemoryType {
    type Err = UnknownMemoryType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MemoryType::ALL
            .into_iter()
            .find(|memory_type| memory_type.as_str() == value)
            .ok_or_else(|| UnknownMemoryType(value.to_string()))
    }
}

/// Structured metadata attached to a memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryMetadata {
    /// Record classification.
    pub memory_type: MemoryType,
    /// Recognized technology keywords, in vocabulary order.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// URLs in order of first appearance.
    #[serde(default)]
    pub urls: Vec<String>,
    /// First code-fence language tag, empty when none.
    #[serde(default)]
    pub language: String,
    /// Caller-supplied labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp, fixed for the record's lifetime.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last search hit.
    pub last_accessed: DateTime<Utc>,
    /// Number of search results that surfaced this record.
    #[serde(default)]
    pub access_count: u64,
    /// Provenance, set only by the bulk loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Marks records created by the bulk loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_load: Option<bool>,
}

impl MemoryMetadata {
    /// Serialize into the JSON object stored by the index.
    pub fn to_value(&self) -> Result<serde_json::Value, MemoryError> {
        serde_json::to_value(self).map_err(|err| MemoryError::Extraction(err.to_string()))
    }

    /// Decode metadata previously stored by the index.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MemoryError> {
        serde_json::from_value(value).map_err(|err| MemoryError::Extraction(err.to_string()))
    }

    /// Record one search hit.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now;
    }

    /// Whether this record was ingested from the seed file.
    pub fn is_initial_knowledge(&self) -> bool {
        self.source.as_deref() == Some(INITIAL_KNOWLEDGE_SOURCE)
    }
}

/// Persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Record identifier.
    pub id: String,
    /// Record content.
    pub content: String,
    /// Classification and bookkeeping metadata.
    pub metadata: MemoryMetadata,
}

impl MemoryRecord {
    /// Content shortened to `max_chars` characters with a trailing ellipsis.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            return self.content.clone();
        }
        let mut preview: String = self.content.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }
}
