//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::engine::{Pacing, RunnerConfig};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Server endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Pacing between replayed actions
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Where and how participants connect
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/join`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Query parameter carrying the participant name
    #[serde(default = "default_participant_param")]
    pub participant_param: String,

    /// Query parameter carrying the scenario (game) identifier
    #[serde(default = "default_scenario_param")]
    pub scenario_param: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            participant_param: default_participant_param(),
            scenario_param: default_scenario_param(),
        }
    }
}

fn default_endpoint() -> String {
    "ws://localhost:8080/join".to_string()
}
fn default_participant_param() -> String {
    "name".to_string()
}
fn default_scenario_param() -> String {
    "game".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Upper bound on establishing a single participant connection
    #[serde(default = "default_connect")]
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
        }
    }
}

fn default_connect() -> u64 {
    10
}

/// How the replayer waits between actions
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Sleep a fixed interval after each send
    #[default]
    Fixed,
    /// Wait until every session has been idle for a while
    Idle,
}

/// Pacing settings in milliseconds
#[derive(Debug, Deserialize)]
pub struct PacingConfig {
    #[serde(default)]
    pub mode: PacingMode,

    /// Fixed quiescence interval
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Silence required before the idle barrier releases
    #[serde(default = "default_idle")]
    pub idle_ms: u64,

    /// Upper bound on a single idle barrier
    #[serde(default = "default_max")]
    pub max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            mode: PacingMode::default(),
            interval_ms: default_interval(),
            idle_ms: default_idle(),
            max_ms: default_max(),
        }
    }
}

fn default_interval() -> u64 {
    50
}
fn default_idle() -> u64 {
    50
}
fn default_max() -> u64 {
    2000
}

impl PacingConfig {
    /// Resolve into the pacing strategy used by the replayer
    pub fn pacing(&self) -> Pacing {
        match self.mode {
            PacingMode::Fixed => Pacing::Fixed(Duration::from_millis(self.interval_ms)),
            PacingMode::Idle => Pacing::Idle {
                idle: Duration::from_millis(self.idle_ms),
                max: Duration::from_millis(self.max_ms),
            },
        }
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        if config.pacing.mode == PacingMode::Idle && config.pacing.idle_ms > config.pacing.max_ms {
            return Err(Error::ConfigParse(format!(
                "pacing.idle_ms ({}) must not exceed pacing.max_ms ({})",
                config.pacing.idle_ms, config.pacing.max_ms
            )));
        }
        Ok(config)
    }

    /// Settings handed to the scenario runner
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            connect_timeout: Duration::from_secs(self.timeouts.connect_secs),
            pacing: self.pacing.pacing(),
        }
    }
}
