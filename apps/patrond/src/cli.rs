//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// patrond - attribute organization donations to their open source dependencies
#[derive(Parser)]
#[command(name = "patrond")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Attribute organization donations to their open source dependencies")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the database path
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Process a queue batch file ({"Records":[{"messageId","body"}]})
    Process {
        /// Path to the batch file, or - for stdin
        file: PathBuf,
    },

    /// Process a single donation event body
    Donate {
        /// Path to the donation JSON, or - for stdin
        file: PathBuf,
    },

    /// Create the database and apply migrations
    Migrate,

    /// Release an organization lock left behind by a crashed worker
    Unlock {
        /// Organization id
        organization_id: String,
    },

    /// Show ledger entries recorded for an organization
    Ledger {
        /// Organization id
        organization_id: String,
    },
}
