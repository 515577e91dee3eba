//! Scripted action replay and pacing

use std::time::Duration;

use tokio::time::Instant;

use crate::common::{Error, Result};
use crate::scenario::Scenario;

use super::manager::SessionSet;

/// How long to wait after a send before issuing the next one
///
/// Inbound frames arrive out-of-band from the send call, so each action needs
/// a barrier that lets its server-side effects reach every session first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep a fixed quiescence interval
    Fixed(Duration),
    /// Wait until no session has received anything for `idle`, at most `max`
    Idle { idle: Duration, max: Duration },
}

impl Default for Pacing {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(50))
    }
}

/// Replays a scenario's actions against open sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct Replayer {
    pacing: Pacing,
}

impl Replayer {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Send every action in order, pausing on the pacing barrier after each
    ///
    /// Join-time pushes are settled before the first action. Any fault on an
    /// inbound path aborts the replay at the next barrier.
    pub async fn replay(&self, scenario: &Scenario, sessions: &mut SessionSet) -> Result<()> {
        if !sessions.is_empty() {
            self.settle(sessions).await;
            sessions.check()?;
        }

        for (index, action) in scenario.actions.iter().enumerate() {
            let session = sessions
                .get_mut(&action.participant)
                .ok_or_else(|| Error::UnknownParticipant(action.participant.clone()))?;

            tracing::debug!(
                scenario = %scenario.name,
                step = index + 1,
                participant = %action.participant,
                "Replaying action"
            );
            session.send(&action.payload).await?;

            self.settle(sessions).await;
            sessions.check()?;
        }

        Ok(())
    }

    /// Wait on the pacing barrier
    pub async fn settle(&self, sessions: &SessionSet) {
        match self.pacing {
            Pacing::Fixed(interval) => tokio::time::sleep(interval).await,
            Pacing::Idle { idle, max } => {
                let deadline = Instant::now() + max;
                loop {
                    let before = sessions.received();
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        tracing::warn!(?max, "Sessions still busy when the idle barrier expired");
                        break;
                    }

                    tokio::time::sleep(idle.min(remaining)).await;
                    if sessions.received() == before {
                        break;
                    }
                }
            }
        }
    }
}
