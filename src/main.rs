//! quarry-menubar: headless front-end for the quarry search backend
//!
//! Each subcommand exercises one piece of the menu-bar core from a terminal.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quarry_menubar::config::{Config, LogFormat};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "quarry-menubar")]
#[command(about = "Supervise a local quarry backend and search its databases")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database to use instead of the selected one
    #[arg(long)]
    db: Option<String>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend under supervision until Ctrl+C
    Serve,

    /// Run a single search
    Search {
        /// Search query
        query: String,

        /// Number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only search this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// Search as you type: every stdin line replaces the query
    Watch {
        /// Only search this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// List databases known to the backend tooling
    Databases {
        /// Show the cached list without running discovery
        #[arg(long)]
        no_refresh: bool,
    },

    /// Select the database used by later commands
    Select {
        /// Database name
        name: String,
    },

    /// Show backend index status
    Status,

    /// List indexed documents
    Documents {
        /// Only list this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// List collections
    Collections,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)?;

    // Setup logging; stdout is reserved for command output
    let log_level = config.logging.level.with_verbosity(cli.verbose);
    match config.logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let ctx = AppContext::open(config, cli.db)?;

    match cli.command {
        Commands::Serve => commands::serve(&ctx).await,
        Commands::Search {
            query,
            limit,
            collection,
        } => commands::search_once(&ctx, &query, limit, collection.as_deref()).await,
        Commands::Watch { collection } => commands::watch(&ctx, collection).await,
        Commands::Databases { no_refresh } => commands::list_databases(&ctx, !no_refresh).await,
        Commands::Select { name } => commands::select_database(&ctx, &name),
        Commands::Status => commands::show_status(&ctx).await,
        Commands::Documents { collection } => {
            commands::list_documents(&ctx, collection.as_deref()).await
        }
        Commands::Collections => commands::list_collections(&ctx).await,
    }
}
