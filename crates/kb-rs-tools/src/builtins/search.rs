//! Built-in tool for semantic search.

use crate::builtins::utils::{memory_type_schema, parse_args, parse_memory_type};
use crate::render::render_search;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that ranks memories against a query.
#[derive(Debug, Default)]
pub struct SearchTool;

/// Arguments for SearchTool.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default = "default_include_metadata")]
    include_metadata: bool,
}

fn default_limit() -> usize {
    5
}

fn default_include_metadata() -> bool {
    true
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "kb_search"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for relevant memories"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query to find relevant memories"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 0,
                    "default": 5,
                    "description": "Maximum number of results to return (capped at 10)"
                },
                "memory_type": memory_type_schema("Filter by memory type"),
                "include_metadata": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to include metadata in results"
                }
            },
            "required": ["query"]
        })
    }

    fn action(&self) -> &str {
        "searching memories"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let engine = ctx.query_engine()?;
        let input: SearchArgs = parse_args(args)?;
        let filter = parse_memory_type(input.memory_type.as_deref())?;
        let hits = engine.search(&input.query, input.limit, filter).await?;
        info!("kb_search returned {} hits", hits.len());
        Ok(render_search(&hits, input.include_metadata))
    }
}
