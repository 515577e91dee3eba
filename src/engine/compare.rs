//! Transcript comparison and diff rendering
//!
//! Messages are compared structurally, so key order and whitespace in the
//! source text never matter, and neither does `1` versus `1.0`. Rendering
//! uses compact JSON with sorted keys, one tab-indented line per message.

use std::fmt;

use serde_json::{Number, Value};

use crate::scenario::{Message, Scenario};

use super::manager::SessionSet;

/// Placeholder rendered for an empty transcript
pub const NO_OUTPUT: &str = "<no output>";

/// Outcome of comparing one participant's transcript
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Match,
    Mismatch(Mismatch),
}

/// An expected and an actual transcript that differ
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub participant: String,
    pub expected: Vec<Message>,
    pub actual: Vec<Message>,
}

impl Mismatch {
    /// Expected transcript, rendered
    pub fn want(&self) -> String {
        render_transcript(&self.expected)
    }

    /// Actual transcript, rendered
    pub fn got(&self) -> String {
        render_transcript(&self.actual)
    }

    /// Report block naming the scenario and participant
    pub fn describe(&self, scenario: &str) -> String {
        format!(
            "TEST FAILED [{}] user={}:\ngot:\n{}\nwant:\n{}",
            scenario,
            self.participant,
            self.got(),
            self.want()
        )
    }
}

/// Per-scenario comparison result; no mismatches means pass
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub scenario: String,
    pub mismatches: Vec<Mismatch>,
}

impl ScenarioResult {
    pub fn is_pass(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// All mismatch blocks, separated by blank lines
    pub fn report(&self) -> String {
        self.mismatches
            .iter()
            .map(|m| m.describe(&self.scenario))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pass() {
            write!(f, "TEST PASSED [{}]", self.scenario)
        } else {
            f.write_str(&self.report())
        }
    }
}

/// Render a transcript as tab-indented lines, or the no-output placeholder
pub fn render_transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return format!("\t{NO_OUTPUT}");
    }
    messages.iter().map(|m| format!("\t{m}\n")).collect()
}

/// Structural equality where `1` and `1.0` are the same number
fn same_message(a: &Message, b: &Message) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => same_number(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_message(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| same_message(x, y)))
        }
        _ => a == b,
    }
}

fn same_number(x: &Number, y: &Number) -> bool {
    if x == y {
        return true;
    }
    // Integers compare exactly; a float on either side compares by value
    if x.is_f64() || y.is_f64() {
        return matches!((x.as_f64(), y.as_f64()), (Some(a), Some(b)) if a == b);
    }
    false
}

/// Compare one participant's transcript; order and length both matter
pub fn compare(participant: &str, expected: &[Message], actual: &[Message]) -> MatchResult {
    let matched = expected.len() == actual.len()
        && expected.iter().zip(actual).all(|(e, a)| same_message(e, a));
    if matched {
        MatchResult::Match
    } else {
        MatchResult::Mismatch(Mismatch {
            participant: participant.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

/// Compare every participant listed in the scenario's expected transcripts
///
/// Participants without a session are compared against an empty transcript.
pub fn compare_all(scenario: &Scenario, sessions: &SessionSet) -> ScenarioResult {
    let mismatches = scenario
        .expected
        .iter()
        .filter_map(|(participant, expected)| {
            let actual = sessions
                .get(participant)
                .map(|s| s.messages())
                .unwrap_or_default();
            match compare(participant, expected, &actual) {
                MatchResult::Match => None,
                MatchResult::Mismatch(mismatch) => Some(mismatch),
            }
        })
        .collect();

    ScenarioResult {
        scenario: scenario.name.clone(),
        mismatches,
    }
}
