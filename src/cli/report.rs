//! Console reporting
//!
//! Scenario outcomes go to stdout; logs go to stderr.

use colored::Colorize;

use crate::common::config::Config;
use crate::engine::{Pacing, RunSummary, ScenarioOutcome, Status};
use crate::scenario::Scenario;

/// Print the banner before a run
pub fn header(count: usize, endpoint: &str) {
    println!(
        "\n{} {} scenario(s) against {}\n",
        "Running".blue().bold(),
        count,
        endpoint.white().bold()
    );
}

/// Print one scenario outcome
pub fn outcome(outcome: &ScenarioOutcome) {
    let elapsed = format!("({:.2}s)", outcome.duration.as_secs_f64());

    match (&outcome.result, outcome.status()) {
        (Ok(()), _) => println!(
            "{} {} [{}] {}",
            "✓".green(),
            "TEST PASSED".green().bold(),
            outcome.name,
            elapsed.dimmed()
        ),
        (Err(e), Status::Failed) => {
            println!(
                "{} {} [{}] {}",
                "✗".red(),
                "TEST FAILED".red().bold(),
                outcome.name,
                elapsed.dimmed()
            );
            println!("{}\n", e);
        }
        (Err(e), _) => println!(
            "{} {} [{}]: {} {}",
            "✗".red(),
            "TEST ERROR".red().bold(),
            outcome.name,
            e,
            elapsed.dimmed()
        ),
    }
}

/// Print the totals line after a run
pub fn summary(summary: &RunSummary) {
    let line = format!(
        "{} passed, {} failed, {} errored in {:.2}s",
        summary.passed_count(),
        summary.failed_count(),
        summary.errored_count(),
        summary.duration.as_secs_f64()
    );

    if summary.all_passed() {
        println!("\n{}", line.green().bold());
    } else {
        println!("\n{}", line.red().bold());
    }
}

/// Print one validated scenario
pub fn checked(scenario: &Scenario) {
    println!(
        "  {} {} ({} participant(s), {} action(s))",
        "✓".green(),
        scenario.name.white().bold(),
        scenario.participants().len(),
        scenario.actions.len()
    );
    if let Some(description) = &scenario.description {
        println!("    {}", description.dimmed());
    }
}

/// Print the count after validating
pub fn checked_total(count: usize) {
    println!("\n{} scenario(s) are valid", count.to_string().green().bold());
}

/// Print the effective settings
pub fn settings(config: &Config) {
    let runner = config.runner_config();
    println!("Endpoint: {}", config.server.endpoint);
    println!(
        "Query parameters: {}=<participant>&{}=<scenario>",
        config.server.participant_param, config.server.scenario_param
    );
    println!("Connect timeout: {}s", runner.connect_timeout.as_secs());
    match runner.pacing {
        Pacing::Fixed(interval) => println!("Pacing: fixed {}ms", interval.as_millis()),
        Pacing::Idle { idle, max } => println!(
            "Pacing: idle {}ms (at most {}ms per action)",
            idle.as_millis(),
            max.as_millis()
        ),
    }
}
