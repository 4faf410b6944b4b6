// ABOUTME: Entry point for the banksmith CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use banksmith::config;
use banksmith::error::Result;
use banksmith::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli.command, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    match command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            target,
            gateway,
            timeout_secs,
            concurrency,
            force,
        } => {
            let options = commands::DeployOptions {
                gateway,
                timeout_secs,
                concurrency,
                force,
            };
            commands::deploy(&target.resolve()?, options, output).await
        }
        Commands::Status { target } => commands::status(&target.resolve()?, &output),
        Commands::Holders { target, gateway } => {
            commands::holders(&target.resolve()?, &gateway, &output).await
        }
    }
}
