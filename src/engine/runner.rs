//! Scenario runner
//!
//! Sequences connection setup, replay and comparison for one scenario, and
//! runs lists of scenarios strictly one after another. Results are returned
//! as data; printing is left to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{Error, Result};
use crate::scenario::Scenario;
use crate::transport::Connector;

use super::compare::compare_all;
use super::manager::ConnectionManager;
use super::replay::{Pacing, Replayer};

/// Settings for a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on establishing each participant connection
    pub connect_timeout: Duration,
    /// Barrier between replayed actions
    pub pacing: Pacing,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pacing: Pacing::default(),
        }
    }
}

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    /// Transcripts did not match
    Failed,
    /// A hard error aborted the scenario
    Errored,
}

/// Result of running one scenario
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub duration: Duration,
    pub result: Result<()>,
}

impl ScenarioOutcome {
    pub fn status(&self) -> Status {
        match &self.result {
            Ok(()) => Status::Passed,
            Err(e) if e.is_mismatch() => Status::Failed,
            Err(_) => Status::Errored,
        }
    }

    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregated results of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ScenarioOutcome>,
    pub duration: Duration,
}

impl RunSummary {
    fn count(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status() == status).count()
    }

    pub fn passed_count(&self) -> usize {
        self.count(Status::Passed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(Status::Failed)
    }

    pub fn errored_count(&self) -> usize {
        self.count(Status::Errored)
    }

    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(ScenarioOutcome::passed)
    }
}

/// Drives scenarios against a server through a [`Connector`]
pub struct ScenarioRunner {
    manager: ConnectionManager,
    replayer: Replayer,
}

impl ScenarioRunner {
    pub fn new(connector: Arc<dyn Connector>, config: RunnerConfig) -> Self {
        Self {
            manager: ConnectionManager::new(connector, config.connect_timeout),
            replayer: Replayer::new(config.pacing),
        }
    }

    /// Run one scenario
    ///
    /// Every session opened for the scenario is closed before this returns,
    /// whatever the outcome. Transcript mismatches come back as
    /// [`Error::ScenarioFailure`]; anything else aborted the scenario early.
    pub async fn run_scenario(&self, scenario: &Scenario) -> Result<()> {
        scenario.validate()?;
        tracing::info!(
            scenario = %scenario.name,
            actions = scenario.actions.len(),
            "Running scenario"
        );

        let mut sessions = self
            .manager
            .open(&scenario.participants(), &scenario.name)
            .await?;

        let compared = match self.replayer.replay(scenario, &mut sessions).await {
            Ok(()) => Ok(compare_all(scenario, &sessions)),
            Err(e) => Err(e),
        };

        self.manager.close_all(&mut sessions).await;

        let result = compared?;
        if result.is_pass() {
            Ok(())
        } else {
            Err(Error::ScenarioFailure {
                scenario: scenario.name.clone(),
                report: result.report(),
            })
        }
    }

    /// Run scenarios sequentially, collecting every outcome
    pub async fn run_all(&self, scenarios: &[Scenario]) -> RunSummary {
        self.run_all_with(scenarios, |_| {}).await
    }

    /// Run scenarios sequentially, handing each outcome to `on_outcome` as
    /// soon as it is known
    ///
    /// A failing or erroring scenario never prevents the ones after it from
    /// running.
    pub async fn run_all_with<F>(&self, scenarios: &[Scenario], mut on_outcome: F) -> RunSummary
    where
        F: FnMut(&ScenarioOutcome),
    {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(scenarios.len());

        for scenario in scenarios {
            let scenario_started = Instant::now();
            let result = self.run_scenario(scenario).await;
            let outcome = ScenarioOutcome {
                name: scenario.name.clone(),
                duration: scenario_started.elapsed(),
                result,
            };

            match outcome.status() {
                Status::Passed => tracing::info!(scenario = %outcome.name, "Scenario passed"),
                Status::Failed => tracing::warn!(scenario = %outcome.name, "Scenario failed"),
                Status::Errored => tracing::error!(scenario = %outcome.name, "Scenario errored"),
            }

            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        RunSummary {
            outcomes,
            duration: started.elapsed(),
        }
    }
}
