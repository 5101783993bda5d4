//! Tests for layered configuration loading.

use super::*;
use crate::EmbeddingConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only see files under `root`.
fn isolated_options(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd).with_env(EnvOverrides::default());
    options.system_config_path = Some(root.join("system.json5"));
    options.user_config_path = Some(root.join("user.json5"));
    options
}

/// Verify that an empty config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = KbConfig::load_from_str("{}").expect("config");
    assert_eq!(config, KbConfig::default());
    assert_eq!(config.store.path, "./kb_data");
    assert_eq!(config.store.collection, "knowledge_base");
    assert_eq!(config.seed.initial_file, None);
    assert_eq!(config.embedding.provider, FASTEMBED_PROVIDER);
    assert_eq!(config.embedding.dimensions, FASTEMBED_DIMENSIONS);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = KbConfig::load_from_str("{ unexpected: true }").expect_err("unknown key");
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
    assert!(msg.contains("config:unexpected"));
}

/// Reject wrongly typed nested fields with a dotted path.
#[test]
fn rejects_wrong_field_type() {
    let err = KbConfig::load_from_str("{ embedding: { dimensions: \"big\" } }")
        .expect_err("wrong type");
    let ConfigError::InvalidField { path, .. } = err else {
        panic!("expected invalid field");
    };
    assert_eq!(path, "config:embedding.dimensions");
}

#[test]
fn rejects_semantic_violations() {
    for contents in [
        "{ embedding: { dimensions: 0 } }",
        "{ embedding: { provider: \"openai\" } }",
        "{ embedding: { provider: \"fastembed\", dimensions: 128 } }",
        "{ store: { collection: \"  \" } }",
        "{ store: { path: \"\" } }",
    ] {
        let err = KbConfig::load_from_str(contents).expect_err(contents);
        assert!(matches!(err, ConfigError::Invalid(_)), "{contents}");
    }
}

/// Later layers override earlier ones key by key.
#[test]
fn layered_config_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &root.join("system.json5"),
        "{ store: { path: \"/srv/kb\", collection: \"system\" }, embedding: { provider: \"hashing\", dimensions: 128 } }",
    );
    write_json5(
        &root.join("user.json5"),
        "{ store: { collection: \"user\" } }",
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ seed: { initial_file: \"seed.txt\" } }",
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, "{ store: { collection: \"runtime\" } }");

    let options = isolated_options(root, &cwd).with_runtime_path(&runtime);
    let layered = KbConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.store.path, "/srv/kb");
    assert_eq!(layered.config.store.collection, "runtime");
    assert_eq!(layered.config.embedding, EmbeddingConfig::hashing(128));
    assert_eq!(layered.config.seed.initial_file.as_deref(), Some("seed.txt"));
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime,
        ]
    );
}

/// Environment overrides win over every file layer.
#[test]
fn env_overrides_apply_last() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("user.json5"),
        "{ store: { path: \"/from/user\" }, seed: { initial_file: \"user.txt\" } }",
    );

    let options = isolated_options(root, root).with_env(EnvOverrides {
        data_dir: Some("/from/env".to_string()),
        initial_file: Some("env.txt".to_string()),
    });
    let layered = KbConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.store.path, "/from/env");
    assert_eq!(layered.config.seed.initial_file.as_deref(), Some("env.txt"));
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Env)
    );
}

/// A null seed in a higher layer clears a lower layer's seed.
#[test]
fn null_initial_file_clears_lower_layer() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("system.json5"),
        "{ seed: { initial_file: \"system.txt\" } }",
    );
    write_json5(&root.join("user.json5"), "{ seed: { initial_file: null } }");

    let layered =
        KbConfig::load_layered_with_options(isolated_options(root, root)).expect("layered");
    assert_eq!(layered.config.seed.initial_file, None);
}

/// Schema errors name the layer they came from.
#[test]
fn schema_errors_carry_layer_label() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(&root.join("user.json5"), "{ store: { size: 3 } }");

    let err = KbConfig::load_layered_with_options(isolated_options(root, root))
        .expect_err("schema error");
    let ConfigError::InvalidField { path, message } = err else {
        panic!("expected invalid field");
    };
    assert!(path.starts_with("user("));
    assert!(path.ends_with(":store.size"));
    assert_eq!(message, "unknown key");
}

/// Missing runtime files are an error; missing default layers are not.
#[test]
fn missing_runtime_layer_fails() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let options = isolated_options(root, root).with_runtime_path(root.join("absent.json5"));
    let err = KbConfig::load_layered_with_options(options).expect_err("missing runtime");
    assert!(matches!(err, ConfigError::ReadFailed(_)));

    let layered =
        KbConfig::load_layered_with_options(isolated_options(root, root)).expect("defaults");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config, KbConfig::default());
}

#[test]
fn relative_paths_resolve_against_base() {
    let config = KbConfig::builder()
        .store_path("data")
        .initial_file("/abs/seed.txt")
        .build();
    let base = Path::new("/work");
    assert_eq!(config.store_dir(base), Path::new("/work/data"));
    assert_eq!(config.seed_file(base).as_deref(), Some(Path::new("/abs/seed.txt")));
}
