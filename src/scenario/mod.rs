//! Scenario definitions
//!
//! A scenario names its participants, scripts what each of them sends, and
//! lists the exact transcript each of them must receive.

mod config;
mod loader;

pub use config::{Action, Message, Scenario};
pub use loader::{load_path, load_paths, parse_scenarios};
