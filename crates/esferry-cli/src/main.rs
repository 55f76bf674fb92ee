//! esferry - Main entry point

use clap::Parser;
use esferry_cli::{Cli, Commands};
use esferry_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Pick up ES/AMQP endpoints and credentials from a local .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The --verbose flag wins over ESFERRY_LOG_* variables; without it the
    // environment decides, falling back to info-level console output
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .output(LogOutput::Console)
            .log_file_prefix("esferry")
            .build()
    } else {
        LogConfig::from_env().unwrap_or_default()
    };

    // Initialize logging (ignore errors as the CLI should work without logging)
    let _ = init_logging(&log_config);

    let result = execute_command(&cli).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> esferry_cli::Result<()> {
    match &cli.command {
        Commands::Transfer(args) => esferry_cli::commands::transfer::run(cli, args).await,
        Commands::TransferIndex(args) => {
            esferry_cli::commands::transfer_index::run(cli, args).await
        },
        Commands::Dump(args) => esferry_cli::commands::dump::run(cli, args).await,
        Commands::Indices(args) => esferry_cli::commands::indices::run(cli, args).await,
    }
}
