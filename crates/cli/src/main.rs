//! # stereocam
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Device listing
//! - Capture sessions with keyboard control and graceful shutdown

mod cli;
mod commands;
mod input;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{run_devices, run_session, run_validate};
use logging::LogSettings;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let logging = LogSettings::from_cli(&cli);

    let result = match &cli.command {
        // starts logging itself once the session directory exists
        Commands::Run(args) => run_session(args, &logging).await,
        Commands::Validate(args) => logging.init(None, None).and_then(|()| run_validate(args)),
        Commands::Devices(args) => logging.init(None, None).and_then(|()| run_devices(args)),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
