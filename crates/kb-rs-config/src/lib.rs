//! Configuration models and layered config loading.
//!
//! This crate owns the knowledge base config schema, validation, and the
//! layer-merging logic used by the `kb` binary and embedders of the library.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{
    ConfigLayer, ConfigLayerSource, DATA_DIR_ENV, EnvOverrides, INITIAL_FILE_ENV, LayeredConfig,
    LayeredConfigOptions,
};
/// Configuration schema models.
pub use model::*;
