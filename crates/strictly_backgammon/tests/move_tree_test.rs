//! Tests for backgammon move trees and turn validation.

use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use strictly_backgammon::{
    Backgammon, BackgammonBoard, IllegalBackgammonMove, Leg, Location, MoveTree, Roll, Turn,
};
use strictly_rules::{Color, EndReason, GameRules, Rng};

fn leg(from: u8, to: u8, die: u8) -> Leg {
    Leg::new(Location::Point(from), Location::Point(to), die)
}

fn roll(a: u8, b: u8) -> Roll {
    Roll::new(a, b).unwrap()
}

/// White: one runner on `runner`, the rest stuck on point 1 until it gets
/// home. Black: two checkers on `block`, the rest on point 24.
fn runner_position(runner: u8, block: u8) -> BackgammonBoard {
    let mut board = BackgammonBoard::empty();
    board.place(Color::White, 1, 14);
    board.place(Color::White, runner, 1);
    board.place(Color::Black, block, 2);
    board.place(Color::Black, 24, 13);
    board
}

#[test]
fn test_double_sixes_require_four_legs() {
    let board = BackgammonBoard::standard().with_roll(Color::White, roll(6, 6));
    let tree = MoveTree::build(&board, roll(6, 6));
    assert_eq!(tree.max_legs(), 4);
    assert!(tree.sequences().iter().all(|s| s.len() == 4));

    let short = Turn::new(vec![leg(24, 18, 6), leg(24, 18, 6)]);
    assert_eq!(
        Backgammon.validate(&board, &short),
        Err(IllegalBackgammonMove::NotMaximal {
            used: 2,
            required: 4
        })
    );

    let full = Turn::new(vec![leg(24, 18, 6), leg(24, 18, 6), leg(13, 7, 6), leg(13, 7, 6)]);
    let next = Backgammon.validate(&board, &full).unwrap();
    assert_eq!(next.side_to_move(), Color::Black);
    assert_eq!(next.dice(), None);
    assert_eq!(next.point(18).count, 2);
}

#[test]
fn test_mixed_roll_either_order() {
    let board = BackgammonBoard::standard().with_roll(Color::White, roll(3, 1));
    for order in [
        vec![leg(8, 5, 3), leg(6, 5, 1)],
        vec![leg(6, 5, 1), leg(8, 5, 3)],
    ] {
        assert!(Backgammon.validate(&board, &Turn::new(order)).is_ok());
    }
}

#[test]
fn test_die_not_in_roll() {
    let board = BackgammonBoard::standard().with_roll(Color::White, roll(3, 1));
    let turn = Turn::new(vec![leg(8, 5, 3), leg(8, 5, 3)]);
    assert_eq!(
        Backgammon.validate(&board, &turn),
        Err(IllegalBackgammonMove::DieNotRolled(3))
    );
}

#[test]
fn test_bar_entry_comes_first() {
    let mut board = BackgammonBoard::standard();
    board.place(Color::White, 6, 4);
    board.set_bar(Color::White, 1);
    let board = board.with_roll(Color::White, roll(3, 1));

    let late_entry = Turn::new(vec![
        leg(8, 5, 3),
        Leg::new(Location::Bar, Location::Point(24), 1),
    ]);
    assert_eq!(
        Backgammon.validate(&board, &late_entry),
        Err(IllegalBackgammonMove::NotInMoveTree { leg_index: 0 })
    );

    let entry_first = Turn::new(vec![
        Leg::new(Location::Bar, Location::Point(24), 1),
        leg(8, 5, 3),
    ]);
    assert!(Backgammon.validate(&board, &entry_first).is_ok());
}

#[test]
fn test_hit_reported_and_applied() {
    let mut board = BackgammonBoard::standard();
    board.place(Color::Black, 12, 4);
    board.place(Color::Black, 9, 1);
    let board = board.with_roll(Color::White, roll(4, 1));

    let tree = MoveTree::build(&board, roll(4, 1));
    let hits: Vec<Leg> = tree
        .options_after(&[])
        .unwrap()
        .into_iter()
        .filter(|l| l.hit)
        .collect();
    assert!(hits.contains(&Leg { hit: true, ..leg(13, 9, 4) }));

    let next = Backgammon
        .validate(&board, &Turn::new(vec![leg(13, 9, 4), leg(9, 8, 1)]))
        .unwrap();
    assert_eq!(next.bar(Color::Black), 1);
    assert_eq!(next.point(8).count, 4);
}

#[test]
fn test_higher_die_must_be_played() {
    // 13/7 or 13/8 alone is playable, but point 2 blocks the second die.
    let board = runner_position(13, 2).with_roll(Color::White, roll(5, 6));
    let tree = MoveTree::build(&board, roll(5, 6));
    assert_eq!(tree.max_legs(), 1);
    assert_eq!(tree.forfeited_dice(), &[5]);
    assert_eq!(tree.sequences(), vec![vec![leg(13, 7, 6)]]);

    assert_eq!(
        Backgammon.validate(&board, &Turn::new(vec![leg(13, 8, 5)])),
        Err(IllegalBackgammonMove::NotInMoveTree { leg_index: 0 })
    );
    assert!(Backgammon.validate(&board, &Turn::new(vec![leg(13, 7, 6)])).is_ok());
}

#[test]
fn test_double_partly_forfeited() {
    // 20/14/8 then point 2 is blocked.
    let board = runner_position(20, 2).with_roll(Color::White, roll(6, 6));
    let tree = MoveTree::build(&board, roll(6, 6));
    assert_eq!(tree.max_legs(), 2);
    assert_eq!(tree.forfeited_dice(), &[6, 6]);
    assert_eq!(tree.leaf_count(), 1);
}

#[test]
fn test_pass_only_when_nothing_moves() {
    let mut board = BackgammonBoard::empty();
    for point in 19..=24 {
        board.place(Color::Black, point, 2);
    }
    board.place(Color::Black, 1, 3);
    board.place(Color::White, 6, 14);
    board.set_bar(Color::White, 1);
    let board = board.with_roll(Color::White, roll(5, 3));

    assert_eq!(Backgammon.legal_moves(&board), vec![Turn::pass()]);
    let next = Backgammon.validate(&board, &Turn::pass()).unwrap();
    assert_eq!(next.side_to_move(), Color::Black);

    let open = BackgammonBoard::standard().with_roll(Color::White, roll(5, 3));
    assert_eq!(
        Backgammon.validate(&open, &Turn::pass()),
        Err(IllegalBackgammonMove::NotMaximal {
            used: 0,
            required: 2
        })
    );
}

#[test]
fn test_no_roll_between_turns() {
    let board = BackgammonBoard::standard()
        .with_roll(Color::White, roll(3, 1));
    let next = Backgammon
        .validate(&board, &Turn::new(vec![leg(8, 5, 3), leg(6, 5, 1)]))
        .unwrap();
    assert_eq!(
        Backgammon.validate(&next, &Turn::new(vec![leg(1, 4, 3)])),
        Err(IllegalBackgammonMove::NoRoll)
    );
}

#[test]
fn test_last_checker_wins() {
    let mut board = BackgammonBoard::empty();
    board.place(Color::White, 1, 1);
    board.set_off(Color::White, 14);
    board.place(Color::Black, 20, 14);
    board.set_off(Color::Black, 1);
    let board = board.with_roll(Color::White, roll(2, 1));

    // Either die bears the checker off; the higher one must be used.
    let turn = Turn::new(vec![Leg::new(Location::Point(1), Location::Off, 2)]);
    let next = Backgammon.validate(&board, &turn).unwrap();
    let outcome = Backgammon.status(&next).unwrap();
    assert_eq!(outcome.winner(), Some(Color::White));
    assert_eq!(outcome.reason(), EndReason::BearOff);
    assert_eq!(outcome.points(), 1);
}

#[test]
fn test_gammon_and_backgammon_scoring() {
    let mut gammon = BackgammonBoard::empty();
    gammon.set_off(Color::White, 15);
    gammon.place(Color::Black, 20, 15);
    let outcome = Backgammon.status(&gammon).unwrap();
    assert_eq!(outcome.reason(), EndReason::Gammon);
    assert_eq!(outcome.points(), 2);

    let mut backgammon = gammon.clone();
    backgammon.place(Color::Black, 20, 14);
    backgammon.place(Color::Black, 3, 1);
    let outcome = Backgammon.status(&backgammon).unwrap();
    assert_eq!(outcome.reason(), EndReason::Backgammon);
    assert_eq!(outcome.points(), 3);

    let mut on_bar = gammon.clone();
    on_bar.place(Color::Black, 20, 14);
    on_bar.set_bar(Color::Black, 1);
    assert_eq!(Backgammon.status(&on_bar).map(|o| o.points()), Some(3));

    assert!(Backgammon.status(&BackgammonBoard::standard()).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Random games keep every board consistent, every listed sequence is
    // accepted, and no sequence is a strict prefix of another.
    #[test]
    fn random_games_keep_invariants(seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rules = Backgammon;
        let mut board = rules.initial_board();
        for _ in 0..400 {
            if rules.status(&board).is_some() {
                break;
            }
            let chance = rules.draw_chance(&board, &mut rng);
            board = rules.begin_turn(&board, &chance).unwrap();

            let moves = rules.legal_moves(&board);
            prop_assert!(!moves.is_empty());
            let width = moves[0].legs.len();
            prop_assert!(moves.iter().all(|m| m.legs.len() == width));

            let choice = &moves[rng.gen_range(0..moves.len())];
            let next = rules.validate(&board, choice);
            prop_assert!(next.is_ok(), "{} rejected on\n{}", choice, board.display());
            board = next.unwrap();
            prop_assert!(rules.check_board(&board).is_ok(), "broken board\n{}", board.display());
        }
    }
}
