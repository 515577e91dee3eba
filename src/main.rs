//! Scenario harness CLI
//!
//! Replays declarative multi-participant scenarios against a WebSocket game
//! server and reports transcript mismatches.

use std::path::PathBuf;

use clap::Parser;
use harness::commands::Commands;
use harness::common::{config::Config, logging};
use harness::{cli, Result};

#[derive(Parser)]
#[command(name = "harness", about = "Multi-client WebSocket scenario harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the per-user config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log every send and receive
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let code = match run(cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // Flush buffered file logs before exiting
    drop(log_guard);
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli::dispatch(cli.command, config).await
}
