//! Layered configuration loader.
//!
//! Discovers configuration layers (system, user, cwd, runtime), validates
//! each against the schema, merges them, applies environment overrides and
//! produces a final `KbConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::{
    ConfigError, FASTEMBED_DIMENSIONS, FASTEMBED_PROVIDER, KbConfig, SUPPORTED_EMBEDDING_PROVIDERS,
};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "kb.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".kb";
/// Environment variable overriding `store.path`.
pub const DATA_DIR_ENV: &str = "KB_DATA_DIR";
/// Environment variable overriding `seed.initial_file`.
pub const INITIAL_FILE_ENV: &str = "KB_INITIAL_FILE";

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/kb/kb.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: KbConfig,
    /// Metadata for each layer that contributed.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Explicit config files passed at startup.
    Runtime,
    /// Environment variable overrides (highest precedence).
    Env,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk, `None` for environment overrides.
    pub path: Option<PathBuf>,
}

/// Values read from `KB_DATA_DIR` and `KB_INITIAL_FILE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub data_dir: Option<String>,
    pub initial_file: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment. Empty values are ignored.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            data_dir: read(DATA_DIR_ENV),
            initial_file: read(INITIAL_FILE_ENV),
        }
    }

    fn is_empty(&self) -> bool {
        self.data_dir.is_none() && self.initial_file.is_none()
    }
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used for the cwd layer.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/kb/kb.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.kb/kb.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime config paths applied after the file layers.
    pub runtime_paths: Vec<PathBuf>,
    /// Environment overrides applied last.
    pub env: EnvOverrides,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            env: EnvOverrides::from_env(),
        }
    }

    /// Add a runtime config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the environment overrides.
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }
}

impl KbConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, cwd, runtime, env.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        let file_layers = [
            (ConfigLayerSource::System, options.system_config_path.clone()),
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (ConfigLayerSource::Cwd, Some(cwd.join(DEFAULT_CONFIG_FILE))),
        ];
        for (source, path) in file_layers {
            let Some(path) = path else {
                continue;
            };
            if !seen_paths.insert(utils::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if let Some(layer) = layer_io::load_optional_layer(source, &path)? {
                debug!("loaded {:?} layer", source);
                merge::merge_json_values(&mut merged, &layer.value);
                layers.push(layer.meta);
            }
        }

        for runtime_path in &options.runtime_paths {
            let layer = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            merge::merge_json_values(&mut merged, &layer.value);
            layers.push(layer.meta);
        }

        if !options.env.is_empty() {
            if let Some(data_dir) = &options.env.data_dir {
                debug!("applying {DATA_DIR_ENV} override");
                merge::set_path(&mut merged, &["store", "path"], Value::from(data_dir.as_str()));
            }
            if let Some(initial_file) = &options.env.initial_file {
                debug!("applying {INITIAL_FILE_ENV} override");
                merge::set_path(
                    &mut merged,
                    &["seed", "initial_file"],
                    Value::from(initial_file.as_str()),
                );
            }
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Env,
                path: None,
            });
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.path must not be empty".to_string(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.collection must not be empty".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if !SUPPORTED_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported embedding provider: {}",
                self.embedding.provider
            )));
        }
        if self.embedding.provider == FASTEMBED_PROVIDER
            && self.embedding.dimensions != FASTEMBED_DIMENSIONS
        {
            return Err(ConfigError::Invalid(format!(
                "embedding.dimensions must be {FASTEMBED_DIMENSIONS} for the {FASTEMBED_PROVIDER} provider"
            )));
        }
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value, label: &str) -> Result<KbConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: KbConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
