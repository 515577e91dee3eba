//! In-process transport
//!
//! Routes frames to a [`MemoryBackend`] living in the same process. Used to
//! exercise the harness without a network server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Connector, FrameReceiver, FrameSender, Link, TransportError};

/// Server-side handle for pushing frames to one connected participant
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    /// Create an outbox and the receiving end of its frames
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push a frame; returns false if the participant has gone away
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.tx.send(text.into()).is_ok()
    }
}

/// An in-process server
///
/// The link's inbound stream ends once the backend drops every clone of the
/// participant's [`Outbox`], which it should do in [`MemoryBackend::leave`].
pub trait MemoryBackend: Send + Sync + 'static {
    /// A participant connects; returning `Err` refuses the connection
    fn join(&self, scenario: &str, participant: &str, outbox: Outbox) -> Result<(), String>;

    /// A participant sent a frame
    fn receive(&self, scenario: &str, participant: &str, payload: &str);

    /// A participant closed its link
    fn leave(&self, scenario: &str, participant: &str);
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Connector for a [`MemoryBackend`]
#[derive(Clone)]
pub struct MemoryConnector {
    backend: Arc<dyn MemoryBackend>,
    counters: Arc<Counters>,
}

impl MemoryConnector {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self {
            backend,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Links opened so far
    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Links explicitly closed so far
    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Links opened but not yet closed
    pub fn open_links(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, participant: &str, scenario: &str) -> Result<Link, TransportError> {
        let (outbox, rx) = Outbox::channel();

        self.backend
            .join(scenario, participant, outbox)
            .map_err(TransportError::Refused)?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Link {
            sender: Box::new(MemorySender {
                backend: Arc::clone(&self.backend),
                counters: Arc::clone(&self.counters),
                scenario: scenario.to_string(),
                participant: participant.to_string(),
                open: true,
            }),
            receiver: Box::new(MemoryReceiver { rx }),
        })
    }
}

struct MemorySender {
    backend: Arc<dyn MemoryBackend>,
    counters: Arc<Counters>,
    scenario: String,
    participant: String,
    open: bool,
}

#[async_trait]
impl FrameSender for MemorySender {
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.backend.receive(&self.scenario, &self.participant, text);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.open {
            self.open = false;
            self.backend.leave(&self.scenario, &self.participant);
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for MemorySender {
    fn drop(&mut self) {
        // Dropped without close: still let the backend forget the participant
        if self.open {
            self.backend.leave(&self.scenario, &self.participant);
        }
    }
}

struct MemoryReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameReceiver for MemoryReceiver {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}
