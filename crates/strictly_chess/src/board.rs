//! Chess board snapshots and FEN conversion.

use crate::invariants::ChessInvariants;
use crate::movegen;
use crate::{CastleSide, ChessMove, MoveDetails, Piece, PieceKind, Square};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strictly_rules::{Color, InvariantSet, InvariantViolation};
use tracing::instrument;

/// FEN of the standard starting position.
pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Which castles are still available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    /// White may castle short.
    pub white_kingside: bool,
    /// White may castle long.
    pub white_queenside: bool,
    /// Black may castle short.
    pub black_kingside: bool,
    /// Black may castle long.
    pub black_queenside: bool,
}

impl CastlingRights {
    /// Every castle available.
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    /// Returns true if `color` may still castle on `side`.
    pub fn allows(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside,
            (Color::White, CastleSide::Queenside) => self.white_queenside,
            (Color::Black, CastleSide::Kingside) => self.black_kingside,
            (Color::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    pub(crate) fn revoke(&mut self, color: Color, side: CastleSide) {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside = false,
            (Color::White, CastleSide::Queenside) => self.white_queenside = false,
            (Color::Black, CastleSide::Kingside) => self.black_kingside = false,
            (Color::Black, CastleSide::Queenside) => self.black_queenside = false,
        }
    }

    fn to_fen(self) -> String {
        let mut s = String::new();
        if self.white_kingside {
            s.push('K');
        }
        if self.white_queenside {
            s.push('Q');
        }
        if self.black_kingside {
            s.push('k');
        }
        if self.black_queenside {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

/// Reasons a FEN string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum FenError {
    /// Wrong number of space-separated fields.
    #[display("FEN needs 4 or 6 fields, found {}", _0)]
    FieldCount(usize),

    /// Piece placement is malformed.
    #[display("Invalid piece placement: {}", _0)]
    Placement(String),

    /// Side to move is not `w` or `b`.
    #[display("Invalid side to move '{}'", _0)]
    SideToMove(String),

    /// Castling field contains unknown letters.
    #[display("Invalid castling rights '{}'", _0)]
    Castling(String),

    /// En-passant field is not `-` or a square.
    #[display("Invalid en-passant square '{}'", _0)]
    EnPassant(String),

    /// Move counters are not numbers.
    #[display("Invalid move counter '{}'", _0)]
    Counter(String),

    /// The position breaks a board invariant.
    #[display("Illegal position: {}", _0)]
    Position(String),
}

impl std::error::Error for FenError {}

/// Immutable-per-turn chess position.
///
/// Boards are never changed in place by the rules: a move produces a new
/// board. Serializes as a FEN string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChessBoard {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl ChessBoard {
    /// The standard starting position.
    pub fn standard() -> Self {
        let mut board = Self::empty(Color::White);
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            board.place(file, 0, Piece::new(Color::White, kind));
            board.place(file, 1, Piece::new(Color::White, PieceKind::Pawn));
            board.place(file, 6, Piece::new(Color::Black, PieceKind::Pawn));
            board.place(file, 7, Piece::new(Color::Black, kind));
        }
        board.castling = CastlingRights::all();
        board
    }

    /// A board with no pieces; only useful as a starting point for setups.
    pub(crate) fn empty(side_to_move: Color) -> Self {
        Self {
            squares: [None; 64],
            side_to_move,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    fn place(&mut self, file: u8, rank: u8, piece: Piece) {
        if let Some(square) = Square::new(file, rank) {
            self.squares[square.index()] = Some(piece);
        }
    }

    /// Piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    pub(crate) fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Remaining castling rights.
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// Square a pawn may capture onto en passant.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Half-moves since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Full-move number, starting at 1 and incremented after Black moves.
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub(crate) fn castling_mut(&mut self) -> &mut CastlingRights {
        &mut self.castling
    }

    pub(crate) fn finish_move(&mut self, en_passant: Option<Square>, reset_clock: bool) {
        self.en_passant = en_passant;
        self.halfmove_clock = if reset_clock { 0 } else { self.halfmove_clock + 1 };
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.opponent();
    }

    /// Every piece of `color` with its square.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|piece| piece.color == color)
                .map(|piece| (sq, piece))
        })
    }

    /// Square of `color`'s king.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Returns true if `square` is attacked by any piece of `by`.
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        movegen::is_attacked(self, square, by)
    }

    /// Returns true if `color`'s king is attacked.
    pub fn is_in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_attacked(king, color.opponent()))
    }

    /// Returns true if the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.is_in_check(self.side_to_move)
    }

    /// Derives capture/castle/en-passant metadata of `mv` on this board.
    pub fn details(&self, mv: &ChessMove) -> MoveDetails {
        let piece = self.piece_at(mv.from);
        let kind = piece.map(|p| p.kind);
        let is_pawn = kind == Some(PieceKind::Pawn);
        let en_passant = is_pawn
            && Some(mv.to) == self.en_passant
            && mv.from.file() != mv.to.file()
            && self.piece_at(mv.to).is_none();
        let capture = if en_passant {
            Some(PieceKind::Pawn)
        } else {
            self.piece_at(mv.to).map(|p| p.kind)
        };
        let castle = match kind {
            Some(PieceKind::King) if mv.to.file() as i8 - mv.from.file() as i8 == 2 => {
                Some(CastleSide::Kingside)
            }
            Some(PieceKind::King) if mv.from.file() as i8 - mv.to.file() as i8 == 2 => {
                Some(CastleSide::Queenside)
            }
            _ => None,
        };
        MoveDetails {
            piece: kind,
            capture,
            en_passant,
            castle,
            promotion: mv.promotion,
            double_push: is_pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2,
        }
    }

    /// Parses a position in Forsyth-Edwards Notation.
    ///
    /// The half-move and full-move counters may be omitted.
    ///
    /// # Errors
    ///
    /// Returns [`FenError`] for malformed text or an impossible position
    /// (missing king, pawns on the back rank, side not to move in check).
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let mut board = Self::empty(side_to_move);

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(format!("{} ranks", ranks.len())));
        }
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file = file.saturating_add(skip as u8);
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| FenError::Placement(format!("unknown piece '{}'", c)))?;
                    if file >= 8 {
                        return Err(FenError::Placement(format!("rank {} overflows", rank + 1)));
                    }
                    board.place(file, rank, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::Placement(format!("rank {} has {} files", rank + 1, file)));
            }
        }

        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => board.castling.white_kingside = true,
                    'Q' => board.castling.white_queenside = true,
                    'k' => board.castling.black_kingside = true,
                    'q' => board.castling.black_queenside = true,
                    _ => return Err(FenError::Castling(fields[2].to_string())),
                }
            }
        }

        board.en_passant = match fields[3] {
            "-" => None,
            text => Some(
                text.parse()
                    .map_err(|_| FenError::EnPassant(text.to_string()))?,
            ),
        };

        if fields.len() == 6 {
            board.halfmove_clock = fields[4]
                .parse()
                .map_err(|_| FenError::Counter(fields[4].to_string()))?;
            board.fullmove_number = fields[5]
                .parse()
                .map_err(|_| FenError::Counter(fields[5].to_string()))?;
        }

        ChessInvariants::check_all(&board)
            .map_err(|violations| FenError::Position(InvariantViolation::summarize(&violations)))?;
        Ok(board)
    }

    /// Formats the position in Forsyth-Edwards Notation.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match Square::new(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }
        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {} {} {}",
            placement,
            side,
            self.castling.to_fen(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Formats the board as a human-readable diagram, rank 8 at the top.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for rank in (0..8u8).rev() {
            result.push_str(&format!("{} ", rank + 1));
            for file in 0..8u8 {
                let symbol = Square::new(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map(|p| p.fen_char())
                    .unwrap_or('.');
                result.push(symbol);
                if file < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h");
        result
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for ChessBoard {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_fen())
    }
}

impl<'de> Deserialize<'de> for ChessBoard {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fen = String::deserialize(deserializer)?;
        ChessBoard::from_fen(&fen).map_err(serde::de::Error::custom)
    }
}
