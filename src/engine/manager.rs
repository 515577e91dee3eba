//! Opens, addresses and tears down the sessions of one scenario run

use std::sync::Arc;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::transport::{Connector, TransportError};

use super::session::Session;

/// The sessions of one scenario run, addressable by participant name
#[derive(Debug, Default)]
pub struct SessionSet {
    sessions: Vec<Session>,
}

impl SessionSet {
    /// The session belonging to `participant`
    pub fn get(&self, participant: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.participant() == participant)
    }

    pub fn get_mut(&mut self, participant: &str) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.participant() == participant)
    }

    /// Participant names in connection order
    pub fn participants(&self) -> Vec<&str> {
        self.sessions.iter().map(Session::participant).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Total messages received across all sessions
    pub fn received(&self) -> usize {
        self.sessions.iter().map(Session::received).sum()
    }

    /// First fault recorded by any inbound path
    pub fn check(&self) -> Result<()> {
        self.sessions.iter().try_for_each(Session::check)
    }
}

/// Owns connection establishment and teardown for scenario runs
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
        }
    }

    /// Open one session per distinct participant, in the given order
    ///
    /// Connections are established one after another so the server observes
    /// a deterministic join order. If any participant fails to connect, the
    /// sessions opened so far are closed and the error is returned.
    pub async fn open(&self, participants: &[&str], scenario_id: &str) -> Result<SessionSet> {
        let mut set = SessionSet::default();

        for &participant in participants {
            if set.get(participant).is_some() {
                continue;
            }

            match self.connect(participant, scenario_id).await {
                Ok(session) => set.sessions.push(session),
                Err(e) => {
                    tracing::error!(participant, scenario = scenario_id, error = %e, "Connection failed");
                    self.close_all(&mut set).await;
                    return Err(e);
                }
            }
        }

        Ok(set)
    }

    async fn connect(&self, participant: &str, scenario_id: &str) -> Result<Session> {
        let link = tokio::time::timeout(
            self.connect_timeout,
            self.connector.connect(participant, scenario_id),
        )
        .await
        .map_err(|_| {
            Error::connection(participant, TransportError::Timeout(self.connect_timeout))
        })?
        .map_err(|e| Error::connection(participant, e))?;

        tracing::info!(participant, scenario = scenario_id, "Participant connected");
        Ok(Session::start(participant, link))
    }

    /// Close every session; failures are logged, never raised
    pub async fn close_all(&self, set: &mut SessionSet) {
        for session in &mut set.sessions {
            if let Err(e) = session.close().await {
                tracing::warn!(participant = session.participant(), error = %e, "Close failed");
            }
        }
    }
}
