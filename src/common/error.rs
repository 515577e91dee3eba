//! Error types for the scenario harness
//!
//! Hard errors abort the scenario that raised them. `ScenarioFailure` is the
//! only soft error: it carries the rendered transcript diff and never stops
//! the runner from moving on to the next scenario.

use std::io;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Connection Errors ===
    #[error("Failed to connect participant '{participant}': {source}")]
    Connection {
        participant: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to send as participant '{participant}': {source}")]
    Send {
        participant: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to close the connection of participant '{participant}': {source}")]
    Close {
        participant: String,
        #[source]
        source: TransportError,
    },

    #[error("Participant '{participant}' received a message that is not valid JSON: {reason}")]
    Decode { participant: String, reason: String },

    #[error("Participant '{participant}' lost its connection: {reason}")]
    Inbound { participant: String, reason: String },

    // === Scenario Errors ===
    #[error("Action references participant '{0}' which has no open session")]
    UnknownParticipant(String),

    #[error("Invalid scenario '{scenario}': {reason}")]
    InvalidScenario { scenario: String, reason: String },

    #[error("{report}")]
    ScenarioFailure { scenario: String, report: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a connection error for a participant
    pub fn connection(participant: &str, source: TransportError) -> Self {
        Self::Connection {
            participant: participant.to_string(),
            source,
        }
    }

    /// Create a send error for a participant
    pub fn send(participant: &str, source: TransportError) -> Self {
        Self::Send {
            participant: participant.to_string(),
            source,
        }
    }

    /// Create a close error for a participant
    pub fn close(participant: &str, source: TransportError) -> Self {
        Self::Close {
            participant: participant.to_string(),
            source,
        }
    }

    /// Create an invalid scenario error
    pub fn invalid_scenario(scenario: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            scenario: scenario.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this is a transcript mismatch rather than a hard error
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::ScenarioFailure { .. })
    }
}
