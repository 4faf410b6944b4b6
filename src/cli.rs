// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "banksmith")]
#[command(about = "Resumable deployment of bank ledger contracts")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new banksmith.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Deploy every configured entity, resuming from recorded receipts
    Deploy {
        #[command(flatten)]
        target: Target,

        /// Ledger gateway URL, e.g. http://localhost:8545
        #[arg(long)]
        gateway: String,

        /// Seconds before a single ledger call is abandoned
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Entities deployed at once within a stage
        #[arg(long)]
        concurrency: Option<usize>,

        /// Break an existing run lock
        #[arg(long)]
        force: bool,
    },

    /// Show which entities have receipts
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Show the identifiers registered to each configured holder
    Holders {
        #[command(flatten)]
        target: Target,

        /// Ledger gateway URL
        #[arg(long)]
        gateway: String,
    },
}

/// Where the configuration and receipts live.
#[derive(Args)]
pub struct Target {
    /// Configuration file (default: discovered in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Receipt directory (default: deployments/ next to the configuration)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}
