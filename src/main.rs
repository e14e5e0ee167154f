//! # Report Harness CLI (`rh`)
//!
//! ## Usage
//!
//! ```bash
//! rh --config ./config/reports.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rh init` | Create the SQLite database and run schema migrations |
//! | `rh source add <name>` | Register a source reports can refer to |
//! | `rh source list` | List registered sources |
//! | `rh save <file>` | Save one report or an array of reports from JSON |
//! | `rh status <id> <status>` | Change a report's status |
//! | `rh get <id>` | Print a report as JSON |
//! | `rh query [keywords]` | Filtered or ranked report query |
//! | `rh watch [keywords]` | Poll for newly stored reports |
//!
//! ## Examples
//!
//! ```bash
//! rh init
//! rh source add src-42 --id S1 --url https://feeds.example.org/rss
//! echo '{"content": "flood warning", "source": "src-42"}' | rh save -
//! rh query flood --since 2024-03-01
//! rh watch --interval 5
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use report_harness::{config, get, logging, migrate, query, save, sources};

/// Report Harness CLI — a local-first report ingestion and retrieval service.
#[derive(Parser)]
#[command(
    name = "rh",
    about = "Report Harness — a local-first report ingestion and retrieval service",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/reports.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the sources, reports and
    /// reports_fts tables. Safe to run repeatedly.
    Init,

    /// Manage the source directory.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Save reports from a JSON file (`-` reads stdin).
    ///
    /// Accepts a single report object or an array. Each report's `source`
    /// is resolved against the source directory; an unknown source aborts
    /// the command at that report.
    Save {
        /// Path to the JSON input, or `-` for stdin.
        input: PathBuf,
    },

    /// Change the status of a stored report.
    Status {
        /// Report ID.
        id: String,
        /// New status. An empty string clears it.
        status: String,
    },

    /// Print a stored report as JSON.
    Get {
        /// Report ID.
        id: String,
    },

    /// Query stored reports.
    ///
    /// Without keywords, returns reports in storage order. With keywords,
    /// runs a ranked full-text search over report content.
    Query {
        /// Free-text keywords.
        keywords: Option<String>,

        /// Only return reports stored at or after this instant
        /// (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Maximum number of results (defaults to `[query].default_limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print `{since, reports}` as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Poll for newly stored reports.
    Watch {
        /// Free-text keywords.
        keywords: Option<String>,

        /// Initial watermark (RFC 3339 or YYYY-MM-DD). Defaults to all reports.
        #[arg(long)]
        since: Option<String>,

        /// Seconds between polls.
        #[arg(long, default_value_t = 10)]
        interval: u64,

        /// Stop after this many polls.
        #[arg(long)]
        rounds: Option<u64>,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Register a new source.
    Add {
        /// Unique source name, usable as a lookup key.
        name: String,
        /// Source URL, usable as a lookup key.
        #[arg(long)]
        url: Option<String>,
        /// Explicit canonical ID (a UUID is generated otherwise).
        #[arg(long)]
        id: Option<String>,
    },
    /// List registered sources.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Source { action } => match action {
            SourceAction::Add { name, url, id } => {
                sources::run_source_add(&cfg, &name, url.as_deref(), id.as_deref()).await?;
            }
            SourceAction::List => {
                sources::run_source_list(&cfg).await?;
            }
        },
        Commands::Save { input } => {
            save::run_save(&cfg, &input).await?;
        }
        Commands::Status { id, status } => {
            save::run_status(&cfg, &id, &status).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Query {
            keywords,
            since,
            limit,
            json,
        } => {
            query::run_query(&cfg, keywords, since, limit, json).await?;
        }
        Commands::Watch {
            keywords,
            since,
            interval,
            rounds,
        } => {
            query::run_watch(&cfg, keywords, since, Duration::from_secs(interval), rounds).await?;
        }
    }

    Ok(())
}
