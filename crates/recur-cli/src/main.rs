//! Recur CLI - Recurring charge detector
//!
//! Usage:
//!   recur detect --transactions history.csv   Find recurring charges
//!   recur normalize "NETFLIX.COM*10/01"        Show merchant patterns
//!   recur config                              Print detection thresholds
//!   recur serve --port 3000                   Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_detection_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect {
            transactions,
            existing,
            today,
            json,
        } => commands::cmd_detect(
            &transactions,
            existing.as_deref(),
            today.as_deref(),
            &config,
            json,
        ),
        Commands::Normalize { descriptions } => commands::cmd_normalize(&descriptions, &config),
        Commands::Config => commands::cmd_config(&config),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&host, port, no_auth, config).await,
    }
}
