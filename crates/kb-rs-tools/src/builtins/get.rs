//! Built-in tool for showing one memory in full.

use crate::builtins::utils::{parse_args, require_text};
use crate::render::render_record;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that resolves a partial id and shows the record with all metadata.
#[derive(Debug, Default)]
pub struct GetTool;

#[derive(Debug, Deserialize)]
struct GetArgs {
    memory_id: String,
}

#[async_trait]
impl Tool for GetTool {
    fn name(&self) -> &str {
        "kb_get"
    }

    fn description(&self) -> &str {
        "Show the full content and metadata of one memory"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "description": "The ID of the memory (can be partial ID from kb_list)"
                }
            },
            "required": ["memory_id"]
        })
    }

    fn action(&self) -> &str {
        "reading memory"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let store = ctx.store()?;
        let input: GetArgs = parse_args(args)?;
        let partial_id = require_text("memory_id", &input.memory_id)?;
        let record = store.get_by_prefix(partial_id).await?;
        Ok(render_record(&record))
    }
}
