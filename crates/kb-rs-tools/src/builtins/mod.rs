//! Knowledge base tools.

mod delete;
mod get;
mod list;
mod save;
mod search;
mod update;
mod utils;

use crate::ToolRegistry;
use log::info;
use std::sync::Arc;

pub use delete::DeleteTool;
pub use get::GetTool;
pub use list::ListTool;
pub use save::SaveTool;
pub use search::SearchTool;
pub use update::UpdateTool;

/// Register all knowledge tools with the provided registry.
pub fn register_builtin_tools(registry: &ToolRegistry) {
    registry.register(Arc::new(SaveTool));
    registry.register(Arc::new(SearchTool));
    registry.register(Arc::new(ListTool));
    registry.register(Arc::new(DeleteTool));
    registry.register(Arc::new(GetTool));
    registry.register(Arc::new(UpdateTool));
    info!("registered knowledge tools");
}

/// Build a registry pre-populated with the knowledge tools.
pub fn builtin_tool_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry);
    registry
}
