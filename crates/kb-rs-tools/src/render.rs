//! Human-readable text produced by the knowledge tools.

use crate::ToolError;
use kb_rs_memory::{MemoryError, MemoryRecord, MemoryType, SearchHit};

/// Prefix carried by every failure text.
pub const FAILURE_MARKER: &str = "❌";

const SEPARATOR_WIDTH: usize = 50;
const LIST_ID_CHARS: usize = 8;
const FULL_ID_CHARS: usize = 16;
const LIST_TECHNOLOGIES: usize = 3;

/// Whether a rendered tool result reports a failure.
pub fn is_failure(text: &str) -> bool {
    text.starts_with(FAILURE_MARKER)
}

/// Render a tool failure. `action` names the operation, e.g. "saving memory".
pub fn render_error(action: &str, err: &ToolError) -> String {
    match err {
        ToolError::ToolNotFound(name) => format!("{FAILURE_MARKER} Unknown tool: {name}"),
        ToolError::InvalidArguments(message) => {
            format!("{FAILURE_MARKER} Invalid arguments: {message}")
        }
        ToolError::Memory(MemoryError::StoreUninitialized) => {
            format!("{FAILURE_MARKER} Error: Knowledge base not initialized")
        }
        ToolError::Memory(MemoryError::NotFound(query)) => {
            format!("{FAILURE_MARKER} No memory found with ID containing: {query}")
        }
        ToolError::Memory(MemoryError::AmbiguousMatch { query, candidates }) => {
            let mut text = format!(
                "{FAILURE_MARKER} Multiple memories match '{query}'. Please use a more specific ID:"
            );
            for candidate in candidates {
                text.push_str(&format!("\n- {}...", truncate_id(candidate, FULL_ID_CHARS)));
            }
            text
        }
        ToolError::Memory(err) => format!("{FAILURE_MARKER} Error {action}: {err}"),
    }
}

pub fn render_saved(record: &MemoryRecord) -> String {
    format!(
        "✅ Memory saved successfully!\nID: {}\nType: {}\nTechnologies: {}",
        record.id,
        record.metadata.memory_type,
        join_or_none(&record.metadata.technologies)
    )
}

pub fn render_updated(record: &MemoryRecord) -> String {
    format!(
        "✅ Memory updated successfully!\nID: {}\nType: {}\nTechnologies: {}",
        record.id,
        record.metadata.memory_type,
        join_or_none(&record.metadata.technologies)
    )
}

pub fn render_deleted(id: &str) -> String {
    format!(
        "✅ Memory deleted successfully: {}...",
        truncate_id(id, FULL_ID_CHARS)
    )
}

/// Numbered search results, closest first.
pub fn render_search(hits: &[SearchHit], include_metadata: bool) -> String {
    if hits.is_empty() {
        return "🔍 No relevant memories found for your query.".to_string();
    }
    let entries: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(position, hit)| {
            let mut entry = format!("📝 **Memory {}**:\n{}", position + 1, hit.record.content);
            if include_metadata {
                let metadata = &hit.record.metadata;
                entry.push_str("\n\n📊 **Details:**");
                entry.push_str(&format!("\n- Type: {}", metadata.memory_type));
                entry.push_str(&format!("\n- Created: {}", metadata.created_at.to_rfc3339()));
                if !metadata.technologies.is_empty() {
                    entry.push_str(&format!(
                        "\n- Technologies: {}",
                        metadata.technologies.join(", ")
                    ));
                }
                if !metadata.urls.is_empty() {
                    entry.push_str(&format!("\n- URLs: {}", metadata.urls.join(", ")));
                }
                entry.push_str(&format!("\n- Relevance: {}", percentage(hit.similarity)));
            }
            entry
        })
        .collect();
    format!(
        "🔍 **Found {} relevant memories:**\n\n{}\n\n{}",
        hits.len(),
        "=".repeat(SEPARATOR_WIDTH),
        entries.join("\n\n")
    )
}

/// Listing with short ids. Record content is shown as given; the store
/// has already shortened it when full content was not requested.
pub fn render_list(records: &[MemoryRecord], filter: Option<MemoryType>) -> String {
    if records.is_empty() {
        return match filter {
            Some(memory_type) => format!("📝 No memories found with type '{memory_type}'."),
            None => "📝 No memories found.".to_string(),
        };
    }
    let entries: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let metadata = &record.metadata;
            let mut entry = format!(
                "**{}.** `{}...`\n📝 {}\n🏷️ Type: {}",
                position + 1,
                truncate_id(&record.id, LIST_ID_CHARS),
                record.content,
                metadata.memory_type
            );
            if !metadata.technologies.is_empty() {
                let shown: Vec<&str> = metadata
                    .technologies
                    .iter()
                    .take(LIST_TECHNOLOGIES)
                    .map(String::as_str)
                    .collect();
                entry.push_str(&format!(" | Tech: {}", shown.join(", ")));
            }
            entry.push_str(&format!(
                "\n📅 Created: {}",
                metadata.created_at.format("%Y-%m-%d")
            ));
            if metadata.access_count > 0 {
                entry.push_str(&format!(" | Accessed: {} times", metadata.access_count));
            }
            entry
        })
        .collect();

    let mut header = format!("📚 **Knowledge Base ({} entries", records.len());
    if let Some(memory_type) = filter {
        header.push_str(&format!(", type: {memory_type}"));
    }
    header.push_str("):**");
    format!("{header}\n\n{}", entries.join("\n\n"))
}

/// Full details of one record.
pub fn render_record(record: &MemoryRecord) -> String {
    let metadata = &record.metadata;
    let mut text = format!(
        "📝 **Memory** `{}`\n{}\n\n📊 **Details:**\n- Type: {}",
        record.id, record.content, metadata.memory_type
    );
    text.push_str(&format!(
        "\n- Technologies: {}",
        join_or_none(&metadata.technologies)
    ));
    if !metadata.urls.is_empty() {
        text.push_str(&format!("\n- URLs: {}", metadata.urls.join(", ")));
    }
    if !metadata.language.is_empty() {
        text.push_str(&format!("\n- Language: {}", metadata.language));
    }
    if !metadata.tags.is_empty() {
        text.push_str(&format!("\n- Tags: {}", metadata.tags.join(", ")));
    }
    text.push_str(&format!("\n- Created: {}", metadata.created_at.to_rfc3339()));
    text.push_str(&format!(
        "\n- Last accessed: {}",
        metadata.last_accessed.to_rfc3339()
    ));
    text.push_str(&format!("\n- Accessed: {} times", metadata.access_count));
    if metadata.is_initial_knowledge() {
        text.push_str("\n- Source: initial knowledge");
    }
    text
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(", ")
    }
}

fn percentage(fraction: f32) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn truncate_id(id: &str, max_chars: usize) -> String {
    id.chars().take(max_chars).collect()
}
