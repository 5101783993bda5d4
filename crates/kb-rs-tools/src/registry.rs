//! Registry for tool implementations.

use crate::render::render_error;
use crate::tool::{Tool, ToolSpec};
use crate::{ToolContext, ToolError};
use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory registry for tool implementations.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    /// Map of tool name to implementation.
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool by name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        debug!("registering tool (name={})", tool.name());
        self.tools.write().insert(tool.name().to_string(), tool);
    }

    /// Fetch a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Return tool specs for all registered tools.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.read().values().map(|tool| tool.spec()).collect()
    }

    /// Run a tool and render the outcome as text.
    ///
    /// Never fails: errors come back as text starting with the failure marker.
    pub async fn invoke(&self, name: &str, ctx: &ToolContext, args: Value) -> String {
        let Some(tool) = self.get(name) else {
            warn!("unknown tool requested (name={name})");
            return render_error("running tool", &ToolError::ToolNotFound(name.to_string()));
        };
        match tool.call(ctx, args).await {
            Ok(text) => text,
            Err(err) => {
                warn!("tool failed (name={}, error={})", name, err);
                render_error(tool.action(), &err)
            }
        }
    }
}
