//! Scenario orchestration engine
//!
//! Opens one session per participant, replays the scripted sends with a
//! pacing barrier between them, captures every inbound message per
//! participant and compares the captured transcripts with the expected ones.

mod compare;
mod manager;
mod replay;
mod runner;
mod session;

pub use compare::{
    compare, compare_all, render_transcript, MatchResult, Mismatch, ScenarioResult, NO_OUTPUT,
};
pub use manager::{ConnectionManager, SessionSet};
pub use replay::{Pacing, Replayer};
pub use runner::{RunSummary, RunnerConfig, ScenarioOutcome, ScenarioRunner, Status};
pub use session::Session;
