//! End-to-end scenario runs against the in-memory lobby server

mod common;

use std::sync::Arc;

use common::{ready_transcript, test_config, Lobby};
use harness::engine::{compare_all, ConnectionManager, Replayer, Status};
use harness::transport::MemoryConnector;
use harness::{Error, Scenario, ScenarioRunner};
use serde_json::json;

fn check_game_ready() -> Scenario {
    Scenario::new("check_game_ready")
        .action("colin", r#"{"action": "ready"}"#)
        .action("leo", r#"{"action": "ready"}"#)
        .expect("colin", ready_transcript("check_game_ready"))
        .expect("leo", ready_transcript("check_game_ready"))
}

fn runner(lobby: Lobby) -> (ScenarioRunner, MemoryConnector) {
    let connector = MemoryConnector::new(Arc::new(lobby));
    (
        ScenarioRunner::new(Arc::new(connector.clone()), test_config()),
        connector,
    )
}

#[tokio::test]
async fn test_game_ready_passes_against_correct_server() {
    let lobby = Arc::new(Lobby::correct());
    let connector = MemoryConnector::new(lobby.clone());
    let runner = ScenarioRunner::new(Arc::new(connector.clone()), test_config());

    runner.run_scenario(&check_game_ready()).await.unwrap();

    assert_eq!(connector.opened(), 2);
    assert_eq!(connector.open_links(), 0);
    assert_eq!(lobby.connected("check_game_ready"), 0);
}

#[tokio::test]
async fn test_missing_state_push_fails_for_every_player() {
    let connector = Arc::new(MemoryConnector::new(Arc::new(Lobby::without_state_push())));
    let config = test_config();
    let manager = ConnectionManager::new(connector.clone(), config.connect_timeout);
    let scenario = check_game_ready();

    let mut sessions = manager
        .open(&scenario.participants(), &scenario.name)
        .await
        .unwrap();
    Replayer::new(config.pacing)
        .replay(&scenario, &mut sessions)
        .await
        .unwrap();
    let result = compare_all(&scenario, &sessions);
    manager.close_all(&mut sessions).await;

    assert!(!result.is_pass());
    let failed: Vec<&str> = result
        .mismatches
        .iter()
        .map(|m| m.participant.as_str())
        .collect();
    assert_eq!(failed, vec!["colin", "leo"]);
    for mismatch in &result.mismatches {
        assert_eq!(mismatch.actual.len(), mismatch.expected.len() - 1);
        assert_eq!(mismatch.actual[0], mismatch.expected[0]);
    }
    assert_eq!(connector.open_links(), 0);
}

#[tokio::test]
async fn test_failure_report_names_each_player() {
    let (runner, connector) = runner(Lobby::without_state_push());

    let err = runner.run_scenario(&check_game_ready()).await.unwrap_err();
    assert!(err.is_mismatch());

    let report = err.to_string();
    assert!(report.contains("TEST FAILED [check_game_ready] user=colin:"));
    assert!(report.contains("TEST FAILED [check_game_ready] user=leo:"));
    assert!(report.contains(r#"{"action":"game_state_changed","new_state":"production"}"#));
    assert_eq!(connector.open_links(), 0);
}

#[tokio::test]
async fn test_failing_scenario_does_not_stop_the_run() {
    let (runner, connector) = runner(Lobby::correct());
    let scenarios = vec![
        Scenario::new("lonely_ready")
            .action("colin", r#"{"action": "ready"}"#)
            .expect("colin", ready_transcript("lonely_ready")),
        check_game_ready(),
    ];

    let summary = runner.run_all(&scenarios).await;

    let statuses: Vec<Status> = summary.outcomes.iter().map(|o| o.status()).collect();
    assert_eq!(statuses, vec![Status::Failed, Status::Passed]);
    assert_eq!(summary.passed_count(), 1);
    assert_eq!(summary.failed_count(), 1);
    assert!(!summary.all_passed());
    assert_eq!(connector.open_links(), 0);
}

#[tokio::test]
async fn test_garbage_push_is_a_decode_error() {
    let (runner, connector) = runner(Lobby::correct().with_greeting("this is not json"));

    let err = runner.run_scenario(&check_game_ready()).await.unwrap_err();

    assert!(matches!(err, Error::Decode { ref participant, .. } if participant == "colin"));
    assert_eq!(connector.open_links(), 0);
}

#[tokio::test]
async fn test_refused_participant_aborts_before_replay() {
    let (runner, connector) = runner(Lobby::correct().refusing("leo"));

    let err = runner.run_scenario(&check_game_ready()).await.unwrap_err();

    assert!(matches!(err, Error::Connection { ref participant, .. } if participant == "leo"));
    assert!(!err.is_mismatch());
    assert_eq!(connector.opened(), 1);
    assert_eq!(connector.open_links(), 0);
}

#[tokio::test]
async fn test_observer_joins_without_acting() {
    let (runner, _connector) = runner(Lobby::correct());
    let scenario = Scenario::new("watched_game")
        .action("colin", r#"{"action": "ready"}"#)
        .action("leo", r#"{"action": "ready"}"#)
        .observer("spectator")
        .expect("colin", ready_transcript("watched_game"))
        .expect("leo", ready_transcript("watched_game"))
        .expect(
            "spectator",
            vec![
                json!({"action": "welcome", "game": "watched_game", "state": "waiting"}),
            ],
        );

    // The spectator never readies, so the game never leaves the waiting state
    let err = runner.run_scenario(&scenario).await.unwrap_err();
    let report = err.to_string();
    assert!(report.contains("user=colin"));
    assert!(report.contains("user=leo"));
    assert!(!report.contains("user=spectator"));
}

#[tokio::test]
async fn test_scenario_without_actions_passes() {
    let (runner, connector) = runner(Lobby::correct());
    runner
        .run_scenario(&Scenario::new("nothing_to_do"))
        .await
        .unwrap();
    assert_eq!(connector.opened(), 0);
}
