//! Finsum CLI - process change notifications and inspect reconciler state

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "finsum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the database file
    #[arg(short, long, default_value = "./finsum.db")]
    db_path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one change notification
    Run {
        /// Collection the notification is for (decides the phase)
        #[arg(short, long, default_value = "Expense Details Preliminary")]
        collection: String,

        /// Feed scope/resource identifier
        #[arg(short, long)]
        scope: String,

        /// Logical process name used for the checkpoint
        #[arg(short, long, default_value = "queue-transaction-processor")]
        process_name: String,
    },

    /// Poll the change feed on an interval, processing each batch
    Watch {
        /// Collection to process (decides the phase)
        #[arg(short, long, default_value = "Expense Details Preliminary")]
        collection: String,

        /// Feed scope/resource identifier
        #[arg(short, long)]
        scope: String,

        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 30)]
        interval_secs: u64,
    },

    /// Show the current checkpoint and aggregate counts
    Status {
        /// Logical process name used for the checkpoint
        #[arg(short, long, default_value = "queue-transaction-processor")]
        process_name: String,
    },

    /// List recent run-history entries
    History {
        /// Maximum entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Load source records from a JSON file and log change events for them
    Seed {
        /// Path to a JSON array of source records
        #[arg(short, long)]
        file: PathBuf,

        /// Feed scope to log the change events under
        #[arg(short, long)]
        scope: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Run {
            collection,
            scope,
            process_name,
        } => {
            commands::run::execute(cli.db_path, collection, scope, process_name)?;
        }
        Commands::Watch {
            collection,
            scope,
            interval_secs,
        } => {
            commands::run::watch(cli.db_path, collection, scope, interval_secs)?;
        }
        Commands::Status { process_name } => {
            commands::status::execute(cli.db_path, process_name)?;
        }
        Commands::History { limit } => {
            commands::history::execute(cli.db_path, limit)?;
        }
        Commands::Seed { file, scope } => {
            commands::seed::execute(cli.db_path, file, scope)?;
        }
    }

    Ok(())
}
