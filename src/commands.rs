//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::config::PacingMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios against a live server
    Run {
        /// Scenario files or directories (YAML or JSON)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only run scenarios whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// WebSocket join endpoint (overrides the config file)
        #[arg(long)]
        endpoint: Option<String>,

        /// Barrier used between actions
        #[arg(long, value_enum)]
        pacing: Option<PacingMode>,

        /// Fixed pause after each action, in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Seconds to wait for each participant connection
        #[arg(long)]
        connect_timeout: Option<u64>,
    },

    /// Load and validate scenarios without connecting
    Check {
        /// Scenario files or directories (YAML or JSON)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the config file location and effective settings
    Config,
}
