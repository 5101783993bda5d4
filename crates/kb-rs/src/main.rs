//! `kb`: command-line access to the knowledge base tools.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kb_rs::config::{KbConfig, LayeredConfigOptions};
use kb_rs::memory::{LoadOutcome, SkipReason};
use kb_rs::tools::{FAILURE_MARKER, is_failure};
use kb_rs::{KnowledgeBase, init_logging};
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Command-line options for the knowledge base.
#[derive(Parser)]
#[command(name = "kb", version, about = "Persistent semantic memory store")]
struct Cli {
    /// Extra kb.json5 applied on top of the default layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store directory (overrides config and KB_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Seed file loaded once at startup (overrides config and KB_INITIAL_FILE)
    #[arg(long, global = true)]
    initial_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a memory
    Save {
        content: String,
        /// Memory type override (environment, code_snippet, operational, architectural)
        #[arg(long = "type")]
        memory_type: Option<String>,
        /// Tag to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Search memories by meaning
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long = "type")]
        memory_type: Option<String>,
        /// Only print matching content
        #[arg(long)]
        no_metadata: bool,
    },
    /// List stored memories
    List {
        #[arg(long = "type")]
        memory_type: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print full content instead of a preview
        #[arg(long)]
        full: bool,
    },
    /// Show one memory in full
    Get {
        /// Full or partial id
        id: String,
    },
    /// Replace a memory's content
    Update {
        /// Full or partial id
        id: String,
        content: String,
        #[arg(long = "type")]
        memory_type: Option<String>,
        /// Replacement tag; repeat for several. Existing tags are kept when omitted
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a memory
    Delete {
        /// Full or partial id
        id: String,
    },
    /// Load a seed file now instead of at startup
    Load {
        /// Seed file; defaults to the configured one
        path: Option<PathBuf>,
    },
}

impl Command {
    /// Tool name and arguments for commands served by the tool registry.
    fn tool_call(&self) -> Option<(&'static str, Value)> {
        let call = match self {
            Command::Save {
                content,
                memory_type,
                tags,
            } => {
                let mut args = json!({ "content": content, "memory_type": memory_type });
                if !tags.is_empty() {
                    args["tags"] = json!(tags);
                }
                ("kb_save", args)
            }
            Command::Search {
                query,
                limit,
                memory_type,
                no_metadata,
            } => (
                "kb_search",
                json!({
                    "query": query,
                    "limit": limit,
                    "memory_type": memory_type,
                    "include_metadata": !no_metadata,
                }),
            ),
            Command::List {
                memory_type,
                limit,
                full,
            } => (
                "kb_list",
                json!({ "memory_type": memory_type, "limit": limit, "include_content": full }),
            ),
            Command::Get { id } => ("kb_get", json!({ "memory_id": id })),
            Command::Update {
                id,
                content,
                memory_type,
                tags,
            } => {
                let mut args =
                    json!({ "memory_id": id, "content": content, "memory_type": memory_type });
                if !tags.is_empty() {
                    args["tags"] = json!(tags);
                }
                ("kb_update", args)
            }
            Command::Delete { id } => ("kb_delete", json!({ "memory_id": id })),
            Command::Load { .. } => return None,
        };
        Some(call)
    }
}

/// Entry point for the `kb` binary.
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    info!(
        "starting kb (config_set={}, data_dir_set={}, initial_file_set={})",
        cli.config.is_some(),
        cli.data_dir.is_some(),
        cli.initial_file.is_some()
    );

    let config = load_config(&cli, &cwd)?;
    let kb = KnowledgeBase::open(&config, &cwd)
        .await
        .context("failed to initialize knowledge base")?;

    let text = match &cli.command {
        Command::Load { path } => {
            let Some(path) = path.as_deref().or(kb.seed_file()) else {
                anyhow::bail!("no seed file given and none configured");
            };
            let outcome = kb
                .load_file(path)
                .await
                .context("failed to load seed file")?;
            render_load(path, outcome)
        }
        command => {
            if kb.seed_file().is_some() {
                match kb.load_seed().await {
                    Ok(outcome) => debug!("startup seed load finished ({outcome:?})"),
                    Err(err) => warn!("startup seed load failed: {err}"),
                }
            }
            let Some((tool, args)) = command.tool_call() else {
                anyhow::bail!("command is not a tool call");
            };
            kb.invoke(tool, args).await
        }
    };

    println!("{text}");
    Ok(if is_failure(&text) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Layered config, then command-line overrides.
fn load_config(cli: &Cli, cwd: &Path) -> anyhow::Result<KbConfig> {
    let mut options = LayeredConfigOptions::new(cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered = KbConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    if let Some(data_dir) = cli.data_dir.as_ref() {
        config.store.path = data_dir.to_string_lossy().to_string();
    }
    if let Some(initial_file) = cli.initial_file.as_ref() {
        config.seed.initial_file = Some(initial_file.to_string_lossy().to_string());
    }
    Ok(config)
}

fn render_load(path: &Path, outcome: LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { loaded, failed: 0 } => {
            format!("✅ Loaded {loaded} knowledge entries from initial file")
        }
        LoadOutcome::Loaded { loaded, failed } => format!(
            "✅ Loaded {loaded} knowledge entries from initial file ({failed} failed)"
        ),
        LoadOutcome::Skipped(SkipReason::AlreadyLoaded) => {
            "ℹ️ Initial knowledge already loaded, skipping".to_string()
        }
        LoadOutcome::Skipped(SkipReason::FileMissing) => format!(
            "{FAILURE_MARKER} Initial knowledge file not found: {}",
            path.display()
        ),
        LoadOutcome::Skipped(SkipReason::StoreUninitialized) => {
            format!("{FAILURE_MARKER} Error: Knowledge base not initialized")
        }
    }
}
