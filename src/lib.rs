//! Scenario harness for multi-client WebSocket game servers
//!
//! Connects one session per scenario participant, replays scripted sends,
//! captures everything each participant receives and compares the captured
//! transcripts with the expected ones.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod scenario;
pub mod transport;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use engine::{RunSummary, RunnerConfig, ScenarioRunner};
pub use scenario::{Action, Message, Scenario};
