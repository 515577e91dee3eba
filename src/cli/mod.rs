//! CLI command dispatch
//!
//! Loads scenarios and configuration, hands them to the runner and prints
//! the outcome of each scenario as soon as it is known.

mod report;

use std::sync::Arc;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::engine::ScenarioRunner;
use crate::scenario::{self, Scenario};
use crate::transport::WebSocketConnector;

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when scenarios ran but not all of them passed.
pub async fn dispatch(command: Commands, mut config: Config) -> Result<bool> {
    match command {
        Commands::Run {
            paths,
            filter,
            endpoint,
            pacing,
            interval_ms,
            connect_timeout,
        } => {
            if let Some(endpoint) = endpoint {
                config.server.endpoint = endpoint;
            }
            if let Some(mode) = pacing {
                config.pacing.mode = mode;
            }
            if let Some(interval) = interval_ms {
                config.pacing.interval_ms = interval;
            }
            if let Some(secs) = connect_timeout {
                config.timeouts.connect_secs = secs;
            }

            let scenarios = select(scenario::load_paths(&paths)?, filter.as_deref());
            if scenarios.is_empty() {
                return Err(Error::Config(match filter {
                    Some(filter) => format!("No scenarios match filter '{}'", filter),
                    None => "No scenarios found".to_string(),
                }));
            }

            let connector = WebSocketConnector::from_config(&config.server)
                .map_err(|e| Error::Config(e.to_string()))?;
            let runner = ScenarioRunner::new(Arc::new(connector), config.runner_config());

            report::header(scenarios.len(), &config.server.endpoint);
            let summary = runner.run_all_with(&scenarios, report::outcome).await;
            report::summary(&summary);

            Ok(summary.all_passed())
        }

        Commands::Check { paths } => {
            let scenarios = scenario::load_paths(&paths)?;
            for scenario in &scenarios {
                report::checked(scenario);
            }
            report::checked_total(scenarios.len());
            Ok(true)
        }

        Commands::Config => {
            match paths::config_path() {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not present, using defaults)", path.display()),
                None => println!("Config file: unavailable on this platform"),
            }
            report::settings(&config);
            Ok(true)
        }
    }
}

/// Keep scenarios whose name contains `filter`, preserving order
fn select(scenarios: Vec<Scenario>, filter: Option<&str>) -> Vec<Scenario> {
    match filter {
        Some(filter) => scenarios
            .into_iter()
            .filter(|s| s.name.contains(filter))
            .collect(),
        None => scenarios,
    }
}
