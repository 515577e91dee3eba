//! Transport boundary between the harness and the server under test
//!
//! A [`Connector`] opens one bidirectional text-frame link per participant.
//! The link is split so the inbound reader task and the replayer can use the
//! two directions independently.

pub mod memory;
pub mod websocket;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryBackend, MemoryConnector, Outbox};
pub use websocket::WebSocketConnector;

/// Failures raised by a transport implementation
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Connection refused: {0}")]
    Refused(String),

    #[error("Connection is closed")]
    Closed,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Received a binary frame that is not valid UTF-8")]
    InvalidUtf8,
}

/// Outbound half of a participant link
#[async_trait]
pub trait FrameSender: Send {
    /// Send one text frame verbatim
    async fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Close the link; closing an already-closed link is not an error
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Whether frames can still be sent
    fn is_open(&self) -> bool;
}

/// Inbound half of a participant link
#[async_trait]
pub trait FrameReceiver: Send {
    /// Next text frame, or `None` once the peer has closed the link
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;
}

/// A ready, open link for one participant
pub struct Link {
    pub sender: Box<dyn FrameSender>,
    pub receiver: Box<dyn FrameReceiver>,
}

/// Opens participant links against the server under test
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect `participant` to the session identified by `scenario`
    ///
    /// Resolves only once the transport has signaled ready.
    async fn connect(&self, participant: &str, scenario: &str) -> Result<Link, TransportError>;
}
