//! Test helpers shared across kb-rs crates.

pub mod memory;
pub mod seed;

pub use memory::{FailingIndex, FlakyIndex, open_temp_store};
pub use seed::write_seed_file;
