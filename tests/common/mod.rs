//! Shared fixtures: an in-process lobby server reachable in memory or over a
//! real WebSocket listener.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use harness::engine::{Pacing, RunnerConfig};
use harness::transport::{MemoryBackend, Outbox};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Fast settings for tests against in-process servers
pub fn test_config() -> RunnerConfig {
    RunnerConfig {
        connect_timeout: Duration::from_secs(2),
        pacing: Pacing::Fixed(Duration::from_millis(50)),
    }
}

/// Expected transcript for every player of `check_game_ready`
pub fn ready_transcript(game: &str) -> Vec<Value> {
    vec![
        json!({"action": "welcome", "game": game, "state": "waiting"}),
        json!({"action": "game_state_changed", "new_state": "production"}),
    ]
}

struct Player {
    name: String,
    outbox: Outbox,
    ready: bool,
}

struct Game {
    state: &'static str,
    players: Vec<Player>,
}

/// Waiting-room server: welcomes joiners and starts production once every
/// player (at least two) is ready
#[derive(Default)]
pub struct Lobby {
    games: Mutex<HashMap<String, Game>>,
    /// Skip the `game_state_changed` broadcast, like a buggy server would
    omit_state_push: bool,
    /// Push this raw frame to every joiner after the welcome
    extra_greeting: Option<String>,
    /// Participants refused at join
    refused: Vec<String>,
}

impl Lobby {
    pub fn correct() -> Self {
        Self::default()
    }

    pub fn without_state_push() -> Self {
        Self {
            omit_state_push: true,
            ..Self::default()
        }
    }

    pub fn with_greeting(mut self, frame: &str) -> Self {
        self.extra_greeting = Some(frame.to_string());
        self
    }

    pub fn refusing(mut self, participant: &str) -> Self {
        self.refused.push(participant.to_string());
        self
    }

    /// Players currently connected to `game`
    pub fn connected(&self, game: &str) -> usize {
        self.games
            .lock()
            .unwrap()
            .get(game)
            .map_or(0, |g| g.players.len())
    }
}

impl MemoryBackend for Lobby {
    fn join(&self, scenario: &str, participant: &str, outbox: Outbox) -> Result<(), String> {
        if self.refused.iter().any(|r| r == participant) {
            return Err(format!("{participant} may not join"));
        }

        let mut games = self.games.lock().unwrap();
        let game = games.entry(scenario.to_string()).or_insert(Game {
            state: "waiting",
            players: Vec::new(),
        });

        outbox.push(
            json!({"action": "welcome", "game": scenario, "state": game.state}).to_string(),
        );
        if let Some(extra) = &self.extra_greeting {
            outbox.push(extra.as_str());
        }

        game.players.push(Player {
            name: participant.to_string(),
            outbox,
            ready: false,
        });
        Ok(())
    }

    fn receive(&self, scenario: &str, participant: &str, payload: &str) {
        let Ok(message) = serde_json::from_str::<Value>(payload) else {
            return;
        };
        if message["action"] != "ready" {
            return;
        }

        let mut games = self.games.lock().unwrap();
        let Some(game) = games.get_mut(scenario) else {
            return;
        };
        let ready = message.get("ready").and_then(Value::as_bool).unwrap_or(true);
        if let Some(player) = game.players.iter_mut().find(|p| p.name == participant) {
            player.ready = ready;
        }

        let everyone_ready = game.players.len() >= 2 && game.players.iter().all(|p| p.ready);
        if game.state == "waiting" && everyone_ready {
            game.state = "production";
            if !self.omit_state_push {
                let changed =
                    json!({"action": "game_state_changed", "new_state": "production"}).to_string();
                for player in &game.players {
                    player.outbox.push(changed.as_str());
                }
            }
        }
    }

    fn leave(&self, scenario: &str, participant: &str) {
        let mut games = self.games.lock().unwrap();
        if let Some(game) = games.get_mut(scenario) {
            game.players.retain(|p| p.name != participant);
            if game.players.is_empty() {
                games.remove(scenario);
            }
        }
    }
}

/// Serve `lobby` over WebSocket on an ephemeral local port
///
/// Returns the `ws://` join endpoint.
pub async fn spawn_ws_server(lobby: Arc<Lobby>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, Arc::clone(&lobby)));
        }
    });

    format!("ws://{addr}/join")
}

async fn serve(stream: TcpStream, lobby: Arc<Lobby>) {
    let mut query = String::new();
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        query = request.uri().query().unwrap_or_default().to_string();
        Ok(response)
    };
    let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };

    let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let name = params.get("name").cloned().unwrap_or_else(|| "Anonymous".to_string());
    let game = params.get("game").cloned().unwrap_or_else(|| "test".to_string());

    let (mut write, mut read) = ws.split();
    let (outbox, mut frames) = Outbox::channel();
    if lobby.join(&game, &name, outbox).is_err() {
        let _ = write.close().await;
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(text) = frames.recv().await {
            if write.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = read.next().await {
        match message {
            WsMessage::Text(text) => lobby.receive(&game, &name, &text),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    lobby.leave(&game, &name);
    let _ = writer.await;
}
