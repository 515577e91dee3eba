//! WebSocket transport using tokio-tungstenite
//!
//! Each participant joins with `<endpoint>?<participant_param>=<name>&<scenario_param>=<id>`.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{Connector, FrameReceiver, FrameSender, Link, TransportError};
use crate::common::config::ServerConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for servers exposing a WebSocket join endpoint
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    endpoint: Url,
    participant_param: String,
    scenario_param: String,
}

impl WebSocketConnector {
    /// Create a connector using the default `name` / `game` query parameters
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}', expected ws or wss", endpoint.scheme()),
            });
        }

        Ok(Self {
            endpoint,
            participant_param: "name".to_string(),
            scenario_param: "game".to_string(),
        })
    }

    /// Create a connector from the `[server]` config section
    pub fn from_config(server: &ServerConfig) -> Result<Self, TransportError> {
        Ok(Self::new(&server.endpoint)?
            .with_params(&server.participant_param, &server.scenario_param))
    }

    /// Override the query parameter names
    pub fn with_params(mut self, participant_param: &str, scenario_param: &str) -> Self {
        self.participant_param = participant_param.to_string();
        self.scenario_param = scenario_param.to_string();
        self
    }

    /// The URL a participant connects to
    pub fn url_for(&self, participant: &str, scenario: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(&self.participant_param, participant)
            .append_pair(&self.scenario_param, scenario);
        url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, participant: &str, scenario: &str) -> Result<Link, TransportError> {
        let url = self.url_for(participant, scenario);
        tracing::debug!(%url, participant, "Opening WebSocket");

        let (stream, _response) = connect_async(url.as_str()).await?;
        let (sink, stream) = stream.split();

        Ok(Link {
            sender: Box::new(WsSender { sink, open: true }),
            receiver: Box::new(WsReceiver { stream }),
        })
    }
}

struct WsSender {
    sink: SplitSink<WsStream, WsMessage>,
    open: bool,
}

#[async_trait]
impl FrameSender for WsSender {
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }

        match self.sink.send(WsMessage::Text(text.to_owned())).await {
            Ok(()) => Ok(()),
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                self.open = false;
                Err(TransportError::Closed)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

struct WsReceiver {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameReceiver for WsReceiver {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(text)),
                Ok(WsMessage::Binary(bytes)) => {
                    return Some(String::from_utf8(bytes).map_err(|_| TransportError::InvalidUtf8))
                }
                Ok(WsMessage::Close(_)) => return None,
                // Ping/pong and raw frames carry no payload
                Ok(_) => continue,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
