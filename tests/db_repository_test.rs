//! Tests for database repository operations.

use chrono::Utc;
use strictly_boards::{
    GameOutcome, GameRepository, GameSummary, Player, SessionStatus, SnapshotStore, StoredSession,
};
use strictly_rules::{Color, EndReason, GameKind, Outcome};
use tempfile::NamedTempFile;

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, GameRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = GameRepository::open(db_path).expect("Failed to create repository");
    (db_file, repo)
}

fn stored(id: &str, version: u64, record: &str) -> StoredSession {
    StoredSession::new(
        id.to_string(),
        GameKind::Backgammon,
        SessionStatus::InProgress,
        version,
        record.to_string(),
        Utc::now(),
    )
}

fn summary(id: &str, outcome: Outcome) -> GameSummary {
    GameSummary::new(
        id.to_string(),
        GameKind::Backgammon,
        Some(Player::human("alice")),
        Some(Player::human("bob")),
        outcome,
        40,
        Utc::now(),
    )
}

#[test]
fn test_snapshot_round_trip() {
    let (_db, repo) = setup_test_db();
    let snapshot = stored("s1", 3, r#"{"x":1}"#);
    repo.save_snapshot(&snapshot).expect("Save failed");

    let loaded = repo.load_snapshot("s1").expect("Load failed").expect("Missing");
    assert_eq!(loaded.id(), "s1");
    assert_eq!(loaded.kind(), &GameKind::Backgammon);
    assert_eq!(loaded.status(), &SessionStatus::InProgress);
    assert_eq!(loaded.version(), &3);
    assert_eq!(loaded.record(), r#"{"x":1}"#);
}

#[test]
fn test_load_missing_snapshot() {
    let (_db, repo) = setup_test_db();
    assert!(repo.load_snapshot("nothing").expect("Load failed").is_none());
}

#[test]
fn test_older_version_never_overwrites() {
    let (_db, repo) = setup_test_db();
    repo.save_snapshot(&stored("s1", 5, "new")).unwrap();
    repo.save_snapshot(&stored("s1", 4, "old")).unwrap();
    assert_eq!(repo.load_snapshot("s1").unwrap().unwrap().record(), "new");

    repo.save_snapshot(&stored("s1", 6, "newer")).unwrap();
    assert_eq!(repo.load_snapshot("s1").unwrap().unwrap().record(), "newer");
}

#[test]
fn test_delete_snapshot() {
    let (_db, repo) = setup_test_db();
    repo.save_snapshot(&stored("s1", 1, "{}")).unwrap();
    repo.delete_snapshot("s1").expect("Delete failed");
    assert!(repo.load_snapshot("s1").unwrap().is_none());
    repo.delete_snapshot("s1").expect("Deleting twice is fine");
}

#[test]
fn test_snapshots_survive_reopen() {
    let (db, repo) = setup_test_db();
    repo.save_snapshot(&stored("s1", 2, "{}")).unwrap();
    drop(repo);
    let reopened = GameRepository::open(db.path().to_str().unwrap()).unwrap();
    assert!(reopened.load_snapshot("s1").unwrap().is_some());
}

#[test]
fn test_record_result() {
    let (_db, repo) = setup_test_db();
    let result = repo
        .record_result(&summary("g1", Outcome::win(Color::White, EndReason::Gammon, 2)))
        .expect("Record failed");
    assert!(*result.id() > 0);
    assert_eq!(result.winner().as_deref(), Some("white"));
    assert_eq!(result.reason(), "gammon");
    assert_eq!(result.points(), &2);
    assert_eq!(result.outcome_for("alice").unwrap(), Some(GameOutcome::Win));
    assert_eq!(result.outcome_for("bob").unwrap(), Some(GameOutcome::Loss));
    assert_eq!(result.outcome_for("carol").unwrap(), None);
}

#[test]
fn test_player_record_aggregates() {
    let (_db, repo) = setup_test_db();
    repo.record_result(&summary("g1", Outcome::win(Color::White, EndReason::Backgammon, 3)))
        .unwrap();
    repo.record_result(&summary("g2", Outcome::win(Color::Black, EndReason::BearOff, 1)))
        .unwrap();
    repo.record_result(&summary("g3", Outcome::draw(EndReason::Abandoned)))
        .unwrap();

    let alice = repo.player_record("alice").expect("Query failed");
    assert_eq!(alice.games(), &3);
    assert_eq!(alice.wins(), &1);
    assert_eq!(alice.losses(), &1);
    assert_eq!(alice.draws(), &1);
    assert_eq!(alice.points_won(), &3);
    assert_eq!(alice.points_lost(), &1);

    let nobody = repo.player_record("nobody").unwrap();
    assert_eq!(nobody.games(), &0);
    assert_eq!(nobody.win_rate(), 0.0);
    assert_eq!(repo.results_for_player("bob").unwrap().len(), 3);
}
