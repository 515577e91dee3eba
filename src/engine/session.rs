//! One participant's live connection and its captured transcript

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::common::{Error, Result};
use crate::scenario::Message;
use crate::transport::{FrameReceiver, FrameSender, Link, TransportError};

/// Why the inbound path stopped early
#[derive(Debug, Clone)]
enum Fault {
    Decode(String),
    Transport(String),
}

#[derive(Debug, Default)]
struct InboxState {
    messages: Vec<Message>,
    fault: Option<Fault>,
}

/// Log shared between the reader task (sole writer) and the session
#[derive(Debug, Default)]
struct Inbox {
    state: Mutex<InboxState>,
}

impl Inbox {
    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A participant's connection plus its append-only inbound log
pub struct Session {
    participant: String,
    sender: Box<dyn FrameSender>,
    inbox: Arc<Inbox>,
    reader: JoinHandle<()>,
}

impl Session {
    /// Wrap a ready link and start capturing inbound frames
    pub(crate) fn start(participant: &str, link: Link) -> Self {
        let inbox = Arc::new(Inbox::default());
        let reader = tokio::spawn(read_inbound(
            participant.to_string(),
            link.receiver,
            Arc::clone(&inbox),
        ));

        Self {
            participant: participant.to_string(),
            sender: link.sender,
            inbox,
            reader,
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }

    /// Send a payload verbatim
    pub async fn send(&mut self, payload: &str) -> Result<()> {
        if !self.sender.is_open() {
            return Err(Error::send(&self.participant, TransportError::Closed));
        }

        tracing::debug!(participant = %self.participant, payload, "Sending");
        self.sender
            .send(payload)
            .await
            .map_err(|e| Error::send(&self.participant, e))
    }

    /// Snapshot of the messages received so far, in arrival order
    pub fn messages(&self) -> Vec<Message> {
        self.inbox.lock().messages.clone()
    }

    /// Number of messages received so far
    pub fn received(&self) -> usize {
        self.inbox.lock().messages.len()
    }

    /// Surface a fault recorded by the inbound path
    pub fn check(&self) -> Result<()> {
        match &self.inbox.lock().fault {
            None => Ok(()),
            Some(Fault::Decode(reason)) => Err(Error::Decode {
                participant: self.participant.clone(),
                reason: reason.clone(),
            }),
            Some(Fault::Transport(reason)) => Err(Error::Inbound {
                participant: self.participant.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Close the connection and stop capturing
    ///
    /// Closing an already-closed session succeeds.
    pub async fn close(&mut self) -> Result<()> {
        let result = self.sender.close().await;
        self.reader.abort();
        result.map_err(|e| Error::close(&self.participant, e))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("participant", &self.participant)
            .field("open", &self.sender.is_open())
            .field("received", &self.received())
            .finish()
    }
}

/// Inbound path: decode every frame and append it, stopping at the first fault
async fn read_inbound(participant: String, mut receiver: Box<dyn FrameReceiver>, inbox: Arc<Inbox>) {
    while let Some(frame) = receiver.next_frame().await {
        let decoded = match frame {
            Ok(text) => serde_json::from_str::<Message>(&text)
                .map_err(|e| Fault::Decode(format!("{e} in {text:?}"))),
            Err(e) => Err(Fault::Transport(e.to_string())),
        };

        match decoded {
            Ok(message) => {
                tracing::debug!(participant = %participant, %message, "Received");
                inbox.lock().messages.push(message);
            }
            Err(fault) => {
                tracing::error!(participant = %participant, ?fault, "Inbound path failed");
                inbox.lock().fault = Some(fault);
                return;
            }
        }
    }
    tracing::debug!(participant = %participant, "Inbound stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::Scripted;
    use crate::transport::{Connector, MemoryConnector};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    async fn session_for(backend: Scripted, participant: &str) -> (Session, MemoryConnector) {
        let connector = MemoryConnector::new(Arc::new(backend));
        let link = connector.connect(participant, "s").await.unwrap();
        (Session::start(participant, link), connector)
    }

    #[tokio::test]
    async fn test_captures_in_arrival_order() {
        let backend = Scripted::echo().greet(r#"{"action": "welcome"}"#);
        let (mut session, _connector) = session_for(backend, "colin").await;

        session.send(r#"{"n":1}"#).await.unwrap();
        session.send(r#"{ "n" : 2 }"#).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            session.messages(),
            vec![json!({"action": "welcome"}), json!({"n": 1}), json!({"n": 2})]
        );
        assert_eq!(session.received(), 3);
        session.check().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_frame_is_a_decode_fault() {
        let backend = Scripted::echo().greet("not json");
        let (session, _connector) = session_for(backend, "colin").await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = session.check().unwrap_err();
        assert!(matches!(err, Error::Decode { ref participant, .. } if participant == "colin"));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (mut session, connector) = session_for(Scripted::echo(), "leo").await;
        session.close().await.unwrap();
        assert!(!session.is_open());
        assert_eq!(connector.open_links(), 0);

        // A second close is best-effort and quiet
        session.close().await.unwrap();

        let err = session.send("{}").await.unwrap_err();
        assert!(matches!(err, Error::Send { .. }));
    }

    /// Sender whose close handshake never completes
    struct StuckClose;

    #[async_trait::async_trait]
    impl FrameSender for StuckClose {
        async fn send(&mut self, _text: &str) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        async fn close(&mut self) -> std::result::Result<(), TransportError> {
            Err(TransportError::Timeout(Duration::from_secs(1)))
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_close_failure_is_a_close_error() {
        let connector = MemoryConnector::new(Arc::new(Scripted::echo()));
        let mut link = connector.connect("leo", "s").await.unwrap();
        link.sender = Box::new(StuckClose);
        let mut session = Session::start("leo", link);

        let err = session.close().await.unwrap_err();
        assert!(matches!(err, Error::Close { ref participant, .. } if participant == "leo"));
        assert!(err.to_string().starts_with("Failed to close the connection of participant 'leo'"));
    }
}
