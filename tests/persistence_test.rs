//! Sessions survive a restart through the SQLite store.

use serde_json::json;
use std::sync::Arc;
use strictly_boards::{
    GameObserver, GameRepository, GameService, Player, ResultRecorder, ServiceConfig,
    SessionError, SessionStatus, SnapshotStore, StoredSession, TracingObserver, restore_session,
};
use strictly_rules::{Color, GameKind};
use tempfile::NamedTempFile;

fn db_path(file: &NamedTempFile) -> String {
    file.path().to_str().expect("Invalid path").to_string()
}

fn service_over(path: &str, seed: u64) -> GameService {
    let repo = GameRepository::open(path).expect("Failed to open repository");
    GameService::new(
        ServiceConfig::default().with_seed(Some(seed)),
        Arc::new(repo.clone()),
        vec![
            Arc::new(TracingObserver) as Arc<dyn GameObserver>,
            Arc::new(ResultRecorder::new(repo)) as Arc<dyn GameObserver>,
        ],
    )
}

#[test]
fn test_chess_session_resumes_after_restart() {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let path = db_path(&db);

    let before = {
        let service = service_over(&path, 1);
        service
            .create_session(GameKind::Chess, Player::human("alice"), Some("c".to_string()))
            .unwrap();
        service.join_session("c", Player::human("bob")).unwrap();
        for (player, from, to) in [("alice", "e2", "e4"), ("bob", "e7", "e5")] {
            let receipt = service
                .submit_move("c", player, json!({ "from": from, "to": to }))
                .unwrap();
            assert!(receipt.durability().is_persisted());
        }
        service.get_state("c").unwrap()
    };

    let service = service_over(&path, 2);
    assert_eq!(service.session_count(), 0);
    let resumed = service.resume("c").unwrap();
    assert_eq!(resumed.board(), before.board());
    assert_eq!(resumed.version(), before.version());
    assert_eq!(resumed.plies(), &2);
    assert_eq!(resumed.side_to_move(), &Some(Color::White));

    service
        .submit_move("c", "alice", json!({ "from": "g1", "to": "f3" }))
        .unwrap();
    assert_eq!(service.get_state("c").unwrap().plies(), &3);
}

#[test]
fn test_backgammon_session_resumes_with_same_dice() {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let path = db_path(&db);

    let before = {
        let service = service_over(&path, 3);
        let id = service
            .create_session(GameKind::Backgammon, Player::human("alice"), Some("b".to_string()))
            .unwrap()
            .into_value();
        let mut snapshot = service.join_session(&id, Player::human("bob")).unwrap().snapshot().clone();
        for _ in 0..5 {
            let color = snapshot.side_to_move().unwrap();
            let player = snapshot.player(color).unwrap().id.clone();
            let turn = snapshot.legal_moves()[0].clone();
            snapshot = service.submit_move(&id, &player, turn).unwrap().snapshot().clone();
        }
        snapshot
    };

    // Lookups resume lazily.
    let service = service_over(&path, 4);
    let resumed = service.get_state("b").unwrap();
    assert_eq!(resumed.board(), before.board());
    assert_eq!(resumed.legal_moves(), before.legal_moves());
    assert_eq!(resumed.side_to_move(), before.side_to_move());
}

#[test]
fn test_finished_games_are_recorded() {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let path = db_path(&db);
    let service = service_over(&path, 5);

    for id in ["one", "two"] {
        service
            .create_session(GameKind::Chess, Player::human("alice"), Some(id.to_string()))
            .unwrap();
        service.join_session(id, Player::human("bob")).unwrap();
    }
    service.resign("one", "bob").unwrap();
    service.abandon("two").unwrap();

    let repo = GameRepository::open(&path).unwrap();
    let record = repo.player_record("alice").unwrap();
    assert_eq!(record.games(), &2);
    assert_eq!(record.wins(), &1);
    assert_eq!(record.draws(), &1);
    assert_eq!(record.points_won(), &1);

    let bob = repo.player_record("bob").unwrap();
    assert_eq!(bob.losses(), &1);
    assert_eq!(repo.results_for_session("one").unwrap().len(), 1);
}

#[test]
fn test_tampered_record_fails_replay() {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let path = db_path(&db);
    let service = service_over(&path, 6);
    service
        .create_session(GameKind::Chess, Player::human("alice"), Some("t".to_string()))
        .unwrap();
    service.join_session("t", Player::human("bob")).unwrap();
    service
        .submit_move("t", "alice", json!({ "from": "e2", "to": "e4" }))
        .unwrap();

    let repo = GameRepository::open(&path).unwrap();
    let stored = repo.load_snapshot("t").unwrap().unwrap();
    let mut record: serde_json::Value = serde_json::from_str(stored.record()).unwrap();
    record["board"] = json!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    let tampered = record.to_string();

    assert!(matches!(
        restore_session(GameKind::Chess, &tampered),
        Err(SessionError::InvariantViolation(_))
    ));

    let forged = StoredSession::new(
        "t".to_string(),
        GameKind::Chess,
        SessionStatus::InProgress,
        stored.version() + 1,
        tampered,
        *stored.updated_at(),
    );
    repo.save_snapshot(&forged).unwrap();
    let restarted = service_over(&path, 7);
    assert!(matches!(
        restarted.resume("t"),
        Err(SessionError::InvariantViolation(_))
    ));
}

#[test]
fn test_unknown_session_is_not_found() {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let service = service_over(&db_path(&db), 8);
    assert_eq!(
        service.resume("nope").unwrap_err(),
        SessionError::SessionNotFound("nope".to_string())
    );
}
