//! Built-in tool for deleting a memory by partial id.

use crate::builtins::utils::{parse_args, require_text};
use crate::render::render_deleted;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that deletes exactly one memory.
///
/// A partial id matching several records aborts without deleting anything.
#[derive(Debug, Default)]
pub struct DeleteTool;

#[derive(Debug, Deserialize)]
struct DeleteArgs {
    memory_id: String,
}

#[async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &str {
        "kb_delete"
    }

    fn description(&self) -> &str {
        "Delete a memory from the knowledge base"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "description": "The ID of the memory to delete (can be partial ID from kb_list)"
                }
            },
            "required": ["memory_id"]
        })
    }

    fn action(&self) -> &str {
        "deleting memory"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let store = ctx.store()?;
        let input: DeleteArgs = parse_args(args)?;
        let partial_id = require_text("memory_id", &input.memory_id)?;
        let deleted = store.delete_by_prefix(partial_id).await?;
        info!("kb_delete removed memory (id={})", deleted);
        Ok(render_deleted(&deleted))
    }
}
