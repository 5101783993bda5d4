//! Tool interfaces and the knowledge base tools.
//!
//! Tools take JSON arguments and always answer with one human-readable
//! text; failures are recognizable by their leading marker.

pub mod builtins;
pub mod context;
pub mod error;
pub mod registry;
pub mod render;
pub mod tool;

/// Built-in tool registry and registration helper.
pub use builtins::{builtin_tool_registry, register_builtin_tools};
/// Tool context.
pub use context::ToolContext;
/// Tool error type.
pub use error::ToolError;
/// Tool registry type.
pub use registry::ToolRegistry;
/// Failure marker helpers.
pub use render::{FAILURE_MARKER, is_failure};
/// Tool trait and spec type.
pub use tool::{Tool, ToolSpec};
