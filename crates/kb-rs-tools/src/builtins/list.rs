//! Built-in tool for listing stored memories.

use crate::builtins::utils::{memory_type_schema, parse_args, parse_memory_type};
use crate::render::render_list;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that lists memories in storage order.
#[derive(Debug, Default)]
pub struct ListTool;

/// Arguments for ListTool.
#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    include_content: bool,
}

fn default_limit() -> usize {
    10
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        "kb_list"
    }

    fn description(&self) -> &str {
        "List all saved memories with optional filtering"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "memory_type": memory_type_schema("Filter by memory type"),
                "limit": {
                    "type": "integer",
                    "minimum": 0,
                    "default": 10,
                    "description": "Maximum number of entries to return (capped at 50)"
                },
                "include_content": {
                    "type": "boolean",
                    "default": false,
                    "description": "Whether to include full content instead of a summary"
                }
            }
        })
    }

    fn action(&self) -> &str {
        "listing memories"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let store = ctx.store()?;
        let input: ListArgs = parse_args(args)?;
        let filter = parse_memory_type(input.memory_type.as_deref())?;
        let records = store
            .list(filter, input.limit, input.include_content)
            .await?;
        info!("kb_list returned {} entries", records.len());
        Ok(render_list(&records, filter))
    }
}
