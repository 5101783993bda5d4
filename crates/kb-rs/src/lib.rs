//! Public surface for the knowledge base.
//!
//! This crate re-exports the building blocks and wires them together from a
//! loaded config so binaries and embedders start up the same way.

mod bootstrap;

pub use bootstrap::{BootstrapError, KnowledgeBase, embedder_for};

/// Re-export for convenience.
pub use kb_rs_config as config;
/// Re-export for convenience.
pub use kb_rs_memory as memory;
/// Re-export for convenience.
pub use kb_rs_tools as tools;

/// Initialize logging with millisecond timestamps and `RUST_LOG` filtering.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
