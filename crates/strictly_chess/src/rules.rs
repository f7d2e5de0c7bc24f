//! Chess rules behind the shared [`GameRules`] interface.

use crate::invariants::ChessInvariants;
use crate::movegen::{self, promotion_rank};
use crate::{ChessBoard, ChessMove, PieceKind, Square};
use derive_more::Display;
use strictly_rules::{
    Color, EndReason, GameKind, GameRules, InvariantSet, InvariantViolation, Outcome, Rng,
};
use tracing::{debug, instrument};

/// Reason a chess move is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum IllegalChessMove {
    /// The origin square is empty.
    #[display("No piece on {}", _0)]
    NoPiece(Square),

    /// The piece on the origin square belongs to the opponent.
    #[display("The piece on {} belongs to the opponent", _0)]
    NotYourPiece(Square),

    /// The piece cannot move that way (distance, direction, blocked path).
    #[display("{} is not a legal movement for that piece", _0)]
    IllegalMovement(ChessMove),

    /// The move would leave the mover's king attacked.
    #[display("{} leaves the king in check", _0)]
    LeavesKingInCheck(ChessMove),

    /// A pawn reaching the last rank must name its promotion piece.
    #[display("{} must name a promotion piece", _0)]
    PromotionRequired(ChessMove),

    /// Promotion named for a non-pawn, off the last rank, or to a king/pawn.
    #[display("{} is not a valid promotion", _0)]
    InvalidPromotion(ChessMove),
}

impl std::error::Error for IllegalChessMove {}

/// Standard chess rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chess;

impl Chess {
    fn diagnose(board: &ChessBoard, mv: &ChessMove) -> Result<ChessBoard, IllegalChessMove> {
        let color = board.side_to_move();
        let piece = board
            .piece_at(mv.from)
            .ok_or(IllegalChessMove::NoPiece(mv.from))?;
        if piece.color != color {
            return Err(IllegalChessMove::NotYourPiece(mv.from));
        }

        let reaches_last_rank = mv.to.rank() == promotion_rank(color);
        if let Some(kind) = mv.promotion {
            if piece.kind != PieceKind::Pawn || !reaches_last_rank || !kind.is_promotion_target() {
                return Err(IllegalChessMove::InvalidPromotion(*mv));
            }
        }

        let pseudo = movegen::pseudo_legal_moves(board);
        if piece.kind == PieceKind::Pawn && reaches_last_rank && mv.promotion.is_none() {
            let queening = ChessMove::promoting(mv.from, mv.to, PieceKind::Queen);
            return Err(if pseudo.contains(&queening) {
                IllegalChessMove::PromotionRequired(*mv)
            } else {
                IllegalChessMove::IllegalMovement(*mv)
            });
        }
        if !pseudo.contains(mv) {
            return Err(IllegalChessMove::IllegalMovement(*mv));
        }

        let next = movegen::apply(board, mv).ok_or(IllegalChessMove::NoPiece(mv.from))?;
        if next.is_in_check(color) {
            return Err(IllegalChessMove::LeavesKingInCheck(*mv));
        }
        Ok(next)
    }

    /// K vs K, K+minor vs K, or only bishops left and all on one square color.
    fn insufficient_material(board: &ChessBoard) -> bool {
        let others: Vec<(Square, PieceKind)> = [Color::White, Color::Black]
            .into_iter()
            .flat_map(|color| board.pieces(color))
            .map(|(square, piece)| (square, piece.kind))
            .filter(|(_, kind)| *kind != PieceKind::King)
            .collect();
        match others.as_slice() {
            [] => true,
            [(_, single)] => matches!(single, PieceKind::Bishop | PieceKind::Knight),
            [(first, _), ..] => others
                .iter()
                .all(|(square, kind)| *kind == PieceKind::Bishop && square.is_light() == first.is_light()),
        }
    }
}

impl GameRules for Chess {
    type Board = ChessBoard;
    type Move = ChessMove;
    type Chance = ();
    type Illegal = IllegalChessMove;

    const KIND: GameKind = GameKind::Chess;

    fn initial_board(&self) -> ChessBoard {
        ChessBoard::standard()
    }

    fn side_to_move(&self, board: &ChessBoard) -> Color {
        board.side_to_move()
    }

    fn draw_chance<G: Rng + ?Sized>(&self, _board: &ChessBoard, _rng: &mut G) {}

    fn begin_turn(&self, board: &ChessBoard, _chance: &()) -> Result<ChessBoard, IllegalChessMove> {
        Ok(board.clone())
    }

    #[instrument(skip(self, board), fields(fen = %board.to_fen()))]
    fn legal_moves(&self, board: &ChessBoard) -> Vec<ChessMove> {
        let moves = movegen::legal_moves(board);
        debug!(count = moves.len(), "Generated legal moves");
        moves
    }

    #[instrument(skip(self, board, mv), fields(fen = %board.to_fen(), mv = %mv))]
    fn validate(&self, board: &ChessBoard, mv: &ChessMove) -> Result<ChessBoard, IllegalChessMove> {
        let result = Self::diagnose(board, mv);
        if let Err(e) = &result {
            debug!(reason = %e, "Rejected move");
        }
        result
    }

    #[instrument(skip(self, board), fields(fen = %board.to_fen()))]
    fn status(&self, board: &ChessBoard) -> Option<Outcome> {
        let color = board.side_to_move();
        if movegen::legal_moves(board).is_empty() {
            return Some(if board.in_check() {
                Outcome::win(color.opponent(), EndReason::Checkmate, 1)
            } else {
                Outcome::draw(EndReason::Stalemate)
            });
        }
        if board.halfmove_clock() >= 100 {
            return Some(Outcome::draw(EndReason::FiftyMoveRule));
        }
        if Self::insufficient_material(board) {
            return Some(Outcome::draw(EndReason::InsufficientMaterial));
        }
        None
    }

    fn in_check(&self, board: &ChessBoard) -> bool {
        board.in_check()
    }

    fn check_board(&self, board: &ChessBoard) -> Result<(), Vec<InvariantViolation>> {
        ChessInvariants::check_all(board)
    }
}
