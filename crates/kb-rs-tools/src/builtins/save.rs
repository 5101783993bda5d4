//! Built-in tool for saving knowledge.

use crate::builtins::utils::{memory_type_schema, parse_args, require_text};
use crate::render::render_saved;
use crate::{Tool, ToolContext, ToolError};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

/// Tool that classifies and stores a new memory.
#[derive(Debug, Default)]
pub struct SaveTool;

/// Arguments for SaveTool.
#[derive(Debug, Deserialize)]
struct SaveArgs {
    content: String,
    /// Only the specific types override classification; anything else is ignored.
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[async_trait]
impl Tool for SaveTool {
    fn name(&self) -> &str {
        "kb_save"
    }

    fn description(&self) -> &str {
        "Save a memory or piece of knowledge to the knowledge base"
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The content/memory to save"
                },
                "memory_type": memory_type_schema(
                    "Optional type of memory (environment, code_snippet, operational, architectural)"
                ),
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional list of tags for categorization"
                }
            },
            "required": ["content"]
        })
    }

    fn action(&self) -> &str {
        "saving memory"
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let store = ctx.store()?;
        let input: SaveArgs = parse_args(args)?;
        let content = require_text("content", &input.content)?;
        let tags = input.tags.filter(|tags| !tags.is_empty());
        let record = store
            .save(content, input.memory_type.as_deref(), tags)
            .await?;
        info!("kb_save stored memory (id={})", record.id);
        Ok(render_saved(&record))
    }
}
