//! Tests for chess move legality and terminal detection.

use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use strictly_chess::{Chess, ChessBoard, ChessMove, IllegalChessMove, PieceKind, Square};
use strictly_rules::{Color, EndReason, GameRules, Rng};

fn mv(text: &str) -> ChessMove {
    text.parse().unwrap()
}

fn sq(text: &str) -> Square {
    text.parse().unwrap()
}

fn play(board: &ChessBoard, moves: &[&str]) -> ChessBoard {
    moves.iter().fold(board.clone(), |board, text| {
        Chess.validate(&board, &mv(text)).unwrap()
    })
}

#[test]
fn test_opening_pawn_moves() {
    let board = Chess.initial_board();
    let next = Chess.validate(&board, &mv("e2-e4")).unwrap();
    assert_eq!(next.side_to_move(), Color::Black);
    assert_eq!(next.en_passant(), Some(sq("e3")));

    let result = Chess.validate(&board, &mv("e2-e5"));
    assert_eq!(result, Err(IllegalChessMove::IllegalMovement(mv("e2-e5"))));
}

#[test]
fn test_legal_moves_all_validate() {
    let board = play(&Chess.initial_board(), &["e2-e4", "e7-e5", "g1-f3"]);
    for candidate in Chess.legal_moves(&board) {
        assert!(Chess.validate(&board, &candidate).is_ok(), "{candidate} rejected");
    }
}

#[test]
fn test_kingside_castle_moves_rook() {
    let board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let next = Chess.validate(&board, &mv("e1-g1")).unwrap();
    assert_eq!(next.piece_at(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
    assert_eq!(next.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
    assert!(next.piece_at(sq("h1")).is_none());
    assert!(!next.castling().white_kingside);
    assert!(!next.castling().white_queenside);
    assert!(next.castling().black_kingside);
}

#[test]
fn test_cannot_castle_through_attacked_square() {
    let board = ChessBoard::from_fen("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
    assert_eq!(
        Chess.validate(&board, &mv("e1-g1")),
        Err(IllegalChessMove::IllegalMovement(mv("e1-g1")))
    );
    assert!(Chess.validate(&board, &mv("e1-c1")).is_ok());
}

#[test]
fn test_en_passant_removes_captured_pawn() {
    let board = ChessBoard::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
    let next = Chess.validate(&board, &mv("e5-d6")).unwrap();
    assert!(next.piece_at(sq("d5")).is_none());
    assert_eq!(next.piece_at(sq("d6")).map(|p| p.kind), Some(PieceKind::Pawn));
    assert_eq!(next.halfmove_clock(), 0);
}

#[test]
fn test_en_passant_expires_after_one_move() {
    let board = play(
        &Chess.initial_board(),
        &["e2-e4", "a7-a6", "e4-e5", "d7-d5", "h2-h3", "h7-h6"],
    );
    assert_eq!(
        Chess.validate(&board, &mv("e5-d6")),
        Err(IllegalChessMove::IllegalMovement(mv("e5-d6")))
    );
}

#[test]
fn test_promotion_rules() {
    let board = ChessBoard::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(
        Chess.validate(&board, &mv("a7-a8")),
        Err(IllegalChessMove::PromotionRequired(mv("a7-a8")))
    );
    let next = Chess.validate(&board, &mv("a7-a8=N")).unwrap();
    assert_eq!(next.piece_at(sq("a8")).map(|p| p.kind), Some(PieceKind::Knight));

    let king_promotes = ChessMove::promoting(sq("e1"), sq("e2"), PieceKind::Queen);
    assert_eq!(
        Chess.validate(&board, &king_promotes),
        Err(IllegalChessMove::InvalidPromotion(king_promotes))
    );
}

#[test]
fn test_pinned_piece_cannot_move() {
    let board = ChessBoard::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert_eq!(
        Chess.validate(&board, &mv("e2-d3")),
        Err(IllegalChessMove::LeavesKingInCheck(mv("e2-d3")))
    );
}

#[test]
fn test_wrong_side_and_empty_square() {
    let board = Chess.initial_board();
    assert_eq!(
        Chess.validate(&board, &mv("d7-d5")),
        Err(IllegalChessMove::NotYourPiece(sq("d7")))
    );
    assert_eq!(
        Chess.validate(&board, &mv("d4-d5")),
        Err(IllegalChessMove::NoPiece(sq("d4")))
    );
}

#[test]
fn test_fools_mate() {
    let board = play(&Chess.initial_board(), &["f2-f3", "e7-e5", "g2-g4", "d8-h4"]);
    let outcome = Chess.status(&board).unwrap();
    assert_eq!(outcome.winner(), Some(Color::Black));
    assert_eq!(outcome.reason(), EndReason::Checkmate);
    assert!(Chess.legal_moves(&board).is_empty());
}

#[test]
fn test_stalemate() {
    let board = ChessBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let outcome = Chess.status(&board).unwrap();
    assert!(outcome.is_draw());
    assert_eq!(outcome.reason(), EndReason::Stalemate);
}

#[test]
fn test_bare_kings_are_a_draw() {
    let board = ChessBoard::from_fen("8/8/4k3/8/8/8/4K3/8 w - - 0 1").unwrap();
    assert_eq!(
        Chess.status(&board).map(|o| o.reason()),
        Some(EndReason::InsufficientMaterial)
    );
}

#[test]
fn test_ongoing_game_has_no_status() {
    assert!(Chess.status(&Chess.initial_board()).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Every board reached by legal play satisfies the board invariants, and
    // every listed move is accepted by validation.
    #[test]
    fn random_playouts_keep_invariants(seed in any::<u64>(), plies in 1usize..60) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut board = Chess.initial_board();
        for _ in 0..plies {
            if Chess.status(&board).is_some() {
                break;
            }
            let moves = Chess.legal_moves(&board);
            prop_assert!(!moves.is_empty());
            let choice = moves[rng.gen_range(0..moves.len())];
            let next = Chess.validate(&board, &choice);
            prop_assert!(next.is_ok(), "{} rejected on {}", choice, board.to_fen());
            board = next.unwrap();
            prop_assert!(Chess.check_board(&board).is_ok());
            prop_assert_eq!(ChessBoard::from_fen(&board.to_fen()).ok(), Some(board.clone()));
        }
    }
}
