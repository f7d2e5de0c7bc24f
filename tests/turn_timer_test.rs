//! Turn timers end games on time.

use serde_json::json;
use std::time::Duration;
use strictly_boards::{GameService, Player, ServiceConfig, SessionError, SessionStatus};
use strictly_rules::{Color, EndReason, GameKind};

fn timed_service(timeout: Duration) -> GameService {
    GameService::in_memory(
        ServiceConfig::default()
            .with_seed(Some(11))
            .with_turn_timeout(Some(timeout)),
    )
}

fn started_chess(service: &GameService) -> String {
    let id = service
        .create_session(GameKind::Chess, Player::human("alice"), None)
        .unwrap()
        .into_value();
    service.join_session(&id, Player::human("bob")).unwrap();
    id
}

#[tokio::test]
async fn test_idle_side_loses_on_time() {
    let service = timed_service(Duration::from_millis(100));
    let id = started_chess(&service);

    tokio::time::sleep(Duration::from_millis(600)).await;

    let state = service.get_state(&id).unwrap();
    assert_eq!(state.status(), &SessionStatus::Ended);
    let outcome = state.outcome().unwrap();
    assert_eq!(outcome.winner(), Some(Color::Black));
    assert_eq!(outcome.reason(), EndReason::Timeout);
}

#[tokio::test]
async fn test_moves_rearm_the_timer() {
    let service = timed_service(Duration::from_millis(400));
    let id = started_chess(&service);

    for (player, from, to) in [
        ("alice", "e2", "e4"),
        ("bob", "e7", "e5"),
        ("alice", "g1", "f3"),
    ] {
        tokio::time::sleep(Duration::from_millis(150)).await;
        service
            .submit_move(&id, player, json!({ "from": from, "to": to }))
            .unwrap();
    }
    assert_eq!(service.get_state(&id).unwrap().status(), &SessionStatus::InProgress);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let state = service.get_state(&id).unwrap();
    let outcome = state.outcome().unwrap();
    assert_eq!(outcome.winner(), Some(Color::White));
    assert_eq!(outcome.reason(), EndReason::Timeout);
}

#[tokio::test]
async fn test_stale_expiry_is_forbidden() {
    let service = timed_service(Duration::from_secs(60));
    let id = started_chess(&service);
    let armed_at = *service.get_state(&id).unwrap().version();
    service
        .submit_move(&id, "alice", json!({ "from": "e2", "to": "e4" }))
        .unwrap();

    let err = service.expire_turn(&id, armed_at).unwrap_err();
    assert!(matches!(err, SessionError::Forbidden(_)));
    assert_eq!(service.get_state(&id).unwrap().status(), &SessionStatus::InProgress);
}

#[tokio::test]
async fn test_finished_game_ignores_timer() {
    let service = timed_service(Duration::from_millis(100));
    let id = started_chess(&service);
    service.resign(&id, "alice").unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let outcome = service.get_state(&id).unwrap().outcome().unwrap();
    assert_eq!(outcome.reason(), EndReason::Resignation);
}

#[test]
fn test_timers_need_a_runtime() {
    let service = timed_service(Duration::from_millis(1));
    let id = started_chess(&service);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(service.get_state(&id).unwrap().status(), &SessionStatus::InProgress);
}
