//! Concurrent access to one session.

use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use strictly_boards::{GameService, Player, ServiceConfig, SessionError};
use strictly_rules::{Color, GameKind};

fn started_chess(service: &GameService) -> String {
    let id = service
        .create_session(GameKind::Chess, Player::human("alice"), None)
        .unwrap()
        .into_value();
    service.join_session(&id, Player::human("bob")).unwrap();
    id
}

#[test]
fn test_racing_submissions_commit_once() {
    let service = GameService::in_memory(ServiceConfig::default().with_seed(Some(5)));
    let id = started_chess(&service);
    let moves = ["e2e4", "d2d4", "g1f3", "c2c4", "b1c3", "e2e3", "f2f4", "a2a3"];
    let barrier = Arc::new(Barrier::new(moves.len()));

    let results: Vec<Result<(), SessionError>> = thread::scope(|scope| {
        let handles: Vec<_> = moves
            .iter()
            .map(|text| {
                let service = service.clone();
                let barrier = Arc::clone(&barrier);
                let id = id.clone();
                scope.spawn(move || {
                    let (from, to) = text.split_at(2);
                    barrier.wait();
                    service
                        .submit_move(&id, "alice", json!({ "from": from, "to": to }))
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let committed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(err, SessionError::Forbidden(_)), "unexpected {err}");
    }

    let state = service.get_state(&id).unwrap();
    assert_eq!(state.plies(), &1);
    assert_eq!(state.side_to_move(), &Some(Color::Black));
}

#[test]
fn test_readers_see_consistent_snapshots_during_play() {
    let service = GameService::in_memory(ServiceConfig::default().with_seed(Some(6)));
    let id = started_chess(&service);
    let line = [
        ("alice", "e2", "e4"),
        ("bob", "e7", "e5"),
        ("alice", "g1", "f3"),
        ("bob", "b8", "c6"),
        ("alice", "f1", "b5"),
        ("bob", "a7", "a6"),
    ];

    thread::scope(|scope| {
        let reader = {
            let service = service.clone();
            let id = id.clone();
            scope.spawn(move || {
                let mut last = 0;
                for _ in 0..500 {
                    let snapshot = service.get_state(&id).unwrap();
                    assert!(*snapshot.version() >= last, "versions never go backwards");
                    last = *snapshot.version();
                    let expected = if snapshot.plies() % 2 == 0 {
                        Color::White
                    } else {
                        Color::Black
                    };
                    assert_eq!(snapshot.side_to_move(), &Some(expected));
                }
            })
        };
        for (player, from, to) in line {
            service
                .submit_move(&id, player, json!({ "from": from, "to": to }))
                .unwrap();
        }
        reader.join().unwrap();
    });
}

#[test]
fn test_sessions_do_not_share_state() {
    let service = GameService::in_memory(ServiceConfig::default().with_seed(Some(7)));
    let ids: Vec<String> = (0..4).map(|_| started_chess(&service)).collect();

    thread::scope(|scope| {
        for id in &ids {
            let service = service.clone();
            scope.spawn(move || {
                service
                    .submit_move(id, "alice", json!({ "from": "e2", "to": "e4" }))
                    .unwrap();
                service
                    .submit_move(id, "bob", json!({ "from": "c7", "to": "c5" }))
                    .unwrap();
            });
        }
    });

    for id in &ids {
        assert_eq!(service.get_state(id).unwrap().plies(), &2);
    }
    assert_eq!(service.list_sessions().unwrap().len(), 4);
}
