//! LLM Gateway CLI
//!
//! Verify provider connections, list models, and chat from the terminal.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod settings;

use cli::Cli;
use gateway_telemetry::{init_logging, LogOutput, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose, cli.json)?;

    // Execute command
    cli.execute().await
}

/// Initialize logging based on verbosity and format.
fn init_tracing(verbose: u8, json: bool) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let config = LoggingConfig::new(level)
        .with_format(if json { LogOutput::Json } else { LogOutput::Pretty })
        .with_target(verbose > 1);

    init_logging(&config)?;
    Ok(())
}
