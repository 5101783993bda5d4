//! Error type returned by tool invocations.

use kb_rs_memory::MemoryError;
use thiserror::Error;

/// Errors produced while running a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name was not found in registry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The memory layer rejected the operation.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
