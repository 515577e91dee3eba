//! Scenario data types
//!
//! Scenarios deserialize from YAML or JSON. Both the compact form used by
//! hand-written suites and the `input`/`output` layout are accepted:
//!
//! ```yaml
//! name: check_game_ready
//! actions:
//!   - [colin, '{"action": "ready"}']
//!   - participant: leo
//!     payload: { action: ready }
//! expected:
//!   colin:
//!     - { action: welcome, game: check_game_ready, state: waiting }
//!   leo: []
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::common::{Error, Result};

/// One decoded inbound payload; equality is structural
pub type Message = serde_json::Value;

/// A complete test scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Name of the scenario, also used as the server-side game identifier
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default)]
    pub description: Option<String>,
    /// Scripted sends, replayed in order
    #[serde(default, alias = "input")]
    pub actions: Vec<Action>,
    /// Transcript each participant must observe
    #[serde(default, alias = "output")]
    pub expected: BTreeMap<String, Vec<Message>>,
    /// Participants that only listen; connected after the actors
    #[serde(default)]
    pub observers: Vec<String>,
}

/// One scripted outbound message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAction")]
pub struct Action {
    pub participant: String,
    /// Wire-ready text, sent verbatim
    pub payload: String,
}

impl Action {
    pub fn new(participant: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAction {
    Pair(String, Payload),
    Named { participant: String, payload: Payload },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Text(String),
    Structured(serde_json::Value),
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let (participant, payload) = match raw {
            RawAction::Pair(participant, payload) => (participant, payload),
            RawAction::Named {
                participant,
                payload,
            } => (participant, payload),
        };
        let payload = match payload {
            Payload::Text(text) => text,
            Payload::Structured(value) => value.to_string(),
        };
        Self {
            participant,
            payload,
        }
    }
}

impl Scenario {
    /// Create an empty scenario
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            actions: Vec::new(),
            expected: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    /// Append a scripted send
    pub fn action(mut self, participant: &str, payload: &str) -> Self {
        self.actions.push(Action::new(participant, payload));
        self
    }

    /// Set the expected transcript of a participant
    pub fn expect(mut self, participant: &str, messages: Vec<Message>) -> Self {
        self.expected.insert(participant.to_string(), messages);
        self
    }

    /// Add a listen-only participant
    pub fn observer(mut self, participant: &str) -> Self {
        self.observers.push(participant.to_string());
        self
    }

    /// Distinct participants that send, in order of first appearance
    pub fn actors(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.actions
            .iter()
            .map(|a| a.participant.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Every participant that needs a connection: actors first, then observers
    pub fn participants(&self) -> Vec<&str> {
        let mut names = self.actors();
        for observer in &self.observers {
            if !names.contains(&observer.as_str()) {
                names.push(observer);
            }
        }
        names
    }

    /// Expected transcript of a participant (empty if unlisted)
    pub fn expected_for(&self, participant: &str) -> &[Message] {
        self.expected
            .get(participant)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check structural invariants
    ///
    /// Every connected participant must have an entry in `expected`, even if
    /// that entry is an empty list.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "name must not be empty"));
        }

        for (index, action) in self.actions.iter().enumerate() {
            if action.participant.trim().is_empty() {
                return Err(Error::invalid_scenario(
                    &self.name,
                    format!("action {} has an empty participant name", index + 1),
                ));
            }
        }

        let missing: Vec<&str> = self
            .participants()
            .into_iter()
            .filter(|name| !self.expected.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid_scenario(
                &self.name,
                format!(
                    "participants without an expected transcript: {}",
                    missing.join(", ")
                ),
            ));
        }

        Ok(())
    }
}
