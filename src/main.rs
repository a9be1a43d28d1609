// ABOUTME: Entry point for the kahu CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use kahu::config::{self, Config};
use kahu::error::Result;
use kahu::output::{Output, OutputMode};
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

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init { endpoint, force } => {
            config::init_config(&cwd, endpoint.as_deref(), force)?;
            println!("Created {}", config::CONFIG_FILENAME);
            Ok(())
        }
        Commands::Watch {
            target,
            json,
            quiet,
        } => {
            let config = Config::discover(&cwd)?;
            let target = commands::resolve_target(&target, &config)?;
            let mode = if json {
                OutputMode::Json
            } else if quiet {
                OutputMode::Quiet
            } else {
                OutputMode::Normal
            };
            commands::watch(config, target, Output::new(mode)).await
        }
        Commands::Deploy { target } => {
            let config = Config::discover(&cwd)?;
            let target = commands::resolve_target(&target, &config)?;
            commands::deploy(config, target, Output::new(OutputMode::Normal)).await
        }
    }
}
