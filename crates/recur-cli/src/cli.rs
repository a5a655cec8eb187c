//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recur - Find the recurring charges hiding in your statements
#[derive(Parser)]
#[command(name = "recur")]
#[command(about = "Recurring charge and subscription detector", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Detection config file (TOML)
    ///
    /// Overrides ~/.local/share/recur/config/detection.toml and the
    /// built-in defaults. Missing keys keep their default values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect recurring charges in a transaction file
    Detect {
        /// Transactions file (.json or .csv)
        #[arg(short, long)]
        transactions: PathBuf,

        /// Merchant patterns already tracked (.json or one per line)
        #[arg(short, long)]
        existing: Option<PathBuf>,

        /// Reference date for renewal calculation (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the merchant pattern for transaction descriptions
    Normalize {
        /// Raw descriptions, e.g. "NETFLIX.COM*10/01"
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Print the effective detection configuration
    Config,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, requests need a bearer key from RECUR_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },
}
