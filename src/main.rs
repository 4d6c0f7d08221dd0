//! # lakedrop CLI
//!
//! The `lakedrop` binary drives the ingestion pipeline. It provides
//! commands for catalog initialization, change detection, one-shot and
//! continuous ingestion, and catalog inspection.
//!
//! ## Usage
//!
//! ```bash
//! lakedrop --config ./config/lakedrop.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lakedrop init` | Create the SQLite catalog and run schema migrations |
//! | `lakedrop sources` | List configured connectors and their status |
//! | `lakedrop scan <connector>` | Evaluate change detection; print the work order |
//! | `lakedrop run <connector>` | Evaluate and ingest once |
//! | `lakedrop watch <connector>` | Evaluate and ingest on an interval |
//! | `lakedrop stats` | Print catalog counts |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lakedrop::{config, migrate, runner, sources, stats};

/// lakedrop — incremental, content-addressed document ingestion for a
/// file-drop data lake.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/lakedrop.example.toml` for a full
/// example.
#[derive(Parser)]
#[command(
    name = "lakedrop",
    about = "Incremental, content-addressed document ingestion for a file-drop data lake",
    version,
    long_about = "lakedrop watches a drop directory for new or changed files, computes a stable \
    content identity for each, stores the raw bytes exactly once per unique content, and records \
    catalog metadata, observation history, and lineage for every run."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lakedrop.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog schema.
    ///
    /// Creates the SQLite database file and all required tables (docs,
    /// doc_versions, runs, events_lineage, cursors). Idempotent —
    /// running it multiple times is safe.
    Init,

    /// List configured connectors and their status.
    Sources,

    /// Evaluate change detection without ingesting.
    ///
    /// Prints the work order the configured strategy would hand to the
    /// orchestrator, or the no-work reason.
    Scan {
        /// Connector instance name (from `[connectors.file_drop.<name>]`).
        connector: String,
    },

    /// Evaluate change detection and ingest once.
    ///
    /// Executes at most one orchestrator run and prints its statistics:
    /// discovered / ingested / skipped / errors.
    Run {
        /// Connector instance name.
        connector: String,
    },

    /// Evaluate and ingest continuously on an interval.
    Watch {
        /// Connector instance name.
        connector: String,

        /// Seconds between evaluations (overrides config).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Print catalog counts (documents, versions, runs, lineage).
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Catalog initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Scan { connector } => {
            runner::run_scan(&cfg, &connector).await?;
        }
        Commands::Run { connector } => {
            runner::run_once(&cfg, &connector).await?;
        }
        Commands::Watch {
            connector,
            interval,
        } => {
            runner::run_watch(&cfg, &connector, interval).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
