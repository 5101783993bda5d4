//! Built-in tool for replacing a memory's content.

use crate::builtins::utils::{memory_type_schema, parse_args, parse_memory_type, require_text};
use crate::render::render_updated;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use kb_rs_memory::MemoryUpdate;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that rewrites a memory in place, keeping its id and history.
#[derive(Debug, Default)]
pub struct UpdateTool;

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    memory_id: String,
    content: String,
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[async_trait]
impl Tool for UpdateTool {
    fn name(&self) -> &str {
        "kb_update"
    }

    fn description(&self) -> &str {
        "Replace the content of a memory, re-extracting its metadata"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "description": "The ID of the memory to update (can be partial ID from kb_list)"
                },
                "content": {
                    "type": "string",
                    "description": "Replacement content"
                },
                "memory_type": memory_type_schema("Explicit memory type for the new content"),
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Replacement tags; existing tags are kept when omitted"
                }
            },
            "required": ["memory_id", "content"]
        })
    }

    fn action(&self) -> &str {
        "updating memory"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let store = ctx.store()?;
        let input: UpdateArgs = parse_args(args)?;
        let partial_id = require_text("memory_id", &input.memory_id)?;
        require_text("content", &input.content)?;
        let memory_type = parse_memory_type(input.memory_type.as_deref())?;

        let existing = store.get_by_prefix(partial_id).await?;
        let record = store
            .update(
                &existing.id,
                MemoryUpdate {
                    content: input.content,
                    memory_type,
                    tags: input.tags,
                },
            )
            .await?;
        info!("kb_update rewrote memory (id={})", record.id);
        Ok(render_updated(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateTool;
    use crate::{Tool, ToolContext, ToolError};
    use kb_rs_memory::{MemoryError, MemoryType};
    use kb_rs_test_utils::open_temp_store;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn update_reclassifies_and_keeps_id() {
        let (_temp, store) = open_temp_store().await;
        let record = store
            .save("lunch at noon", None, Some(vec!["team".to_string()]))
            .await
            .expect("save");

        let text = UpdateTool
            .call(
                &ToolContext::new(store.clone()),
                json!({
                    "memory_id": &record.id[..8],
                    "content": "to fix the outage, restart the broker"
                }),
            )
            .await
            .expect("update");
        assert!(text.contains(&format!("ID: {}", record.id)));
        assert!(text.contains("Type: operational"));

        let stored = store.get(&record.id).await.expect("get");
        assert_eq!(stored.content, "to fix the outage, restart the broker");
        assert_eq!(stored.metadata.memory_type, MemoryType::Operational);
        assert_eq!(stored.metadata.tags, vec!["team".to_string()]);
        assert_eq!(stored.metadata.created_at, record.metadata.created_at);
    }

    #[tokio::test]
    async fn update_can_assign_general() {
        let (_temp, store) = open_temp_store().await;
        let record = store.save("restart the broker", None, None).await.expect("save");
        UpdateTool
            .call(
                &ToolContext::new(store.clone()),
                json!({
                    "memory_id": &record.id,
                    "content": "restart the broker weekly",
                    "memory_type": "general"
                }),
            )
            .await
            .expect("update");
        let stored = store.get(&record.id).await.expect("get");
        assert_eq!(stored.metadata.memory_type, MemoryType::General);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let (_temp, store) = open_temp_store().await;
        let err = UpdateTool
            .call(
                &ToolContext::new(store),
                json!({ "memory_id": "nope", "content": "x" }),
            )
            .await
            .expect_err("missing");
        assert!(matches!(err, ToolError::Memory(MemoryError::NotFound(_))));
    }
}
