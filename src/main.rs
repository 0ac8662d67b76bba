use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use metascope::cli::{Cli, Commands};
use metascope::config::Config;
use metascope::logging::init_logging;
use metascope::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Load configuration (if available, otherwise use defaults)
    let config = Config::load(&root).unwrap_or_default();

    // The guard MUST be held until program exit to ensure logs are flushed
    let _logging_guard = init_logging(&config.logging, &root)?;

    tracing::info!("metascope starting up");
    metrics::register_metrics();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            metascope::commands::init::run(force).await?;
        }
        Commands::Search {
            snapshot,
            query,
            limit,
            kind,
            exact,
            case_sensitive,
        } => {
            metascope::commands::search::run(&snapshot, &query, limit, &kind, exact, case_sensitive)
                .await?;
        }
        Commands::Stats {
            snapshot,
            prometheus,
        } => {
            metascope::commands::stats::run(&snapshot, prometheus).await?;
        }
    }

    Ok(())
}
