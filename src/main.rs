use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pagesmith::config::{load_config, AppConfig};
use pagesmith::diff::{apply_patch, generate_patch};
use pagesmith::merge::merge;
use pagesmith::model::{CodeChanges, CodeState};
use pagesmith::reconstruct::reconstruct_from_versions;
use pagesmith::server::run_http_server;
use pagesmith::store::{HttpVersionStore, InMemoryVersionStore, VersionClient};
use pagesmith::telemetry::init_tracing;

/// Pagesmith: version history and diff engine for injected page code
#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "Diff, patch and replay the version history of injected JavaScript/CSS.")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); `pagesmith.toml` in the working directory is read when present
    #[arg(short, long, global = true, env = "PAGESMITH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a zero-context unified diff between two files
    Diff {
        #[arg(long)]
        old: PathBuf,
        #[arg(long)]
        new: PathBuf,
        /// Label used in the `---`/`+++` headers
        #[arg(short, long, default_value = "code")]
        label: String,
    },
    /// Apply a unified diff to a file and print the result
    Apply {
        #[arg(short, long)]
        base: PathBuf,
        #[arg(short, long)]
        patch: PathBuf,
    },
    /// Merge an AI changes payload (JSON) into JavaScript and CSS buffers
    Merge {
        #[arg(long)]
        javascript: Option<PathBuf>,
        #[arg(long)]
        css: Option<PathBuf>,
        /// JSON file shaped like {"javascript": {"diff": ...}, "css": {"diff": ...}}
        #[arg(long)]
        changes: PathBuf,
    },
    /// Fetch a site's version chain and print every reconstructed state
    History {
        /// Site code the chain belongs to
        #[arg(short, long)]
        site: String,
    },
    /// Run the reference version store server (in-memory)
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.log) {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: AppConfig) -> Result<()> {
    match command {
        Commands::Diff { old, new, label } => {
            let old = read(&old)?;
            let new = read(&new)?;
            print!("{}", generate_patch(&old, &new, &label));
        }
        Commands::Apply { base, patch } => {
            let base = read(&base)?;
            let patch = read(&patch)?;
            print!("{}", apply_patch(&base, &patch));
        }
        Commands::Merge {
            javascript,
            css,
            changes,
        } => {
            let current = CodeState::new(read_optional(javascript.as_deref())?, read_optional(css.as_deref())?);
            let changes: CodeChanges = serde_json::from_str(&read(&changes)?)
                .context("changes file is not a valid changes payload")?;
            println!("{}", serde_json::to_string_pretty(&merge(&current, &changes))?);
        }
        Commands::History { site } => {
            let store = HttpVersionStore::new(&config.store)?;
            let client = VersionClient::from_config(Arc::new(store), &config.history);
            let versions = client.get_all_versions(&site).await;
            if versions.is_empty() {
                eprintln!("No history for site '{}'.", site);
            }
            let steps = reconstruct_from_versions(&versions);
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
        Commands::Serve => {
            run_http_server(config.server, Arc::new(InMemoryVersionStore::new())).await?;
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_optional(path: Option<&Path>) -> Result<String> {
    path.map(read).transpose().map(Option::unwrap_or_default)
}
