//! Move generation and attack detection.

use crate::{CastleSide, ChessBoard, ChessMove, Piece, PieceKind, Square};
use strictly_rules::Color;

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Rank direction pawns of `color` advance in.
pub(crate) fn pawn_direction(color: Color) -> i8 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Rank on which pawns of `color` promote.
pub(crate) fn promotion_rank(color: Color) -> u8 {
    match color {
        Color::White => 7,
        Color::Black => 0,
    }
}

fn home_rank(color: Color) -> u8 {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

fn pawn_start_rank(color: Color) -> u8 {
    match color {
        Color::White => 1,
        Color::Black => 6,
    }
}

/// Returns true if `square` is attacked by a piece of color `by`.
pub(crate) fn is_attacked(board: &ChessBoard, square: Square, by: Color) -> bool {
    let holds = |sq: Option<Square>, kind: PieceKind| {
        sq.and_then(|sq| board.piece_at(sq)) == Some(Piece::new(by, kind))
    };

    // A pawn of `by` attacks diagonally forward, so look one rank behind.
    let back = -pawn_direction(by);
    if holds(square.offset(-1, back), PieceKind::Pawn) || holds(square.offset(1, back), PieceKind::Pawn) {
        return true;
    }

    if KNIGHT_STEPS
        .iter()
        .any(|&(df, dr)| holds(square.offset(df, dr), PieceKind::Knight))
    {
        return true;
    }

    if KING_STEPS
        .iter()
        .any(|&(df, dr)| holds(square.offset(df, dr), PieceKind::King))
    {
        return true;
    }

    let ray_hits = |dirs: &[(i8, i8)], kinds: [PieceKind; 2]| {
        dirs.iter().any(|&(df, dr)| {
            let mut current = square.offset(df, dr);
            while let Some(sq) = current {
                if let Some(piece) = board.piece_at(sq) {
                    return piece.color == by && kinds.contains(&piece.kind);
                }
                current = sq.offset(df, dr);
            }
            false
        })
    };

    ray_hits(&ORTHOGONAL, [PieceKind::Rook, PieceKind::Queen])
        || ray_hits(&DIAGONAL, [PieceKind::Bishop, PieceKind::Queen])
}

/// Moves obeying piece movement rules, ignoring whether the mover's king is
/// left in check. Castling is fully checked here since its legality depends
/// on attacked squares the king passes through.
pub(crate) fn pseudo_legal_moves(board: &ChessBoard) -> Vec<ChessMove> {
    let color = board.side_to_move();
    let mut moves = Vec::with_capacity(48);

    for (from, piece) in board.pieces(color) {
        match piece.kind {
            PieceKind::Pawn => pawn_moves(board, from, color, &mut moves),
            PieceKind::Knight => step_moves(board, from, color, &KNIGHT_STEPS, &mut moves),
            PieceKind::Bishop => slide_moves(board, from, color, &DIAGONAL, &mut moves),
            PieceKind::Rook => slide_moves(board, from, color, &ORTHOGONAL, &mut moves),
            PieceKind::Queen => {
                slide_moves(board, from, color, &ORTHOGONAL, &mut moves);
                slide_moves(board, from, color, &DIAGONAL, &mut moves);
            }
            PieceKind::King => {
                step_moves(board, from, color, &KING_STEPS, &mut moves);
                castle_moves(board, from, color, &mut moves);
            }
        }
    }

    moves
}

fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut Vec<ChessMove>) {
    if to.rank() == promotion_rank(color) {
        for kind in PieceKind::PROMOTIONS {
            moves.push(ChessMove::promoting(from, to, kind));
        }
    } else {
        moves.push(ChessMove::new(from, to));
    }
}

fn pawn_moves(board: &ChessBoard, from: Square, color: Color, moves: &mut Vec<ChessMove>) {
    let dir = pawn_direction(color);

    if let Some(one) = from.offset(0, dir).filter(|sq| board.piece_at(*sq).is_none()) {
        push_pawn_move(from, one, color, moves);
        if from.rank() == pawn_start_rank(color) {
            if let Some(two) = one.offset(0, dir).filter(|sq| board.piece_at(*sq).is_none()) {
                moves.push(ChessMove::new(from, two));
            }
        }
    }

    for df in [-1, 1] {
        let Some(target) = from.offset(df, dir) else {
            continue;
        };
        match board.piece_at(target) {
            Some(piece) if piece.color != color => push_pawn_move(from, target, color, moves),
            None if board.en_passant() == Some(target) => moves.push(ChessMove::new(from, target)),
            _ => {}
        }
    }
}

fn step_moves(
    board: &ChessBoard,
    from: Square,
    color: Color,
    steps: &[(i8, i8)],
    moves: &mut Vec<ChessMove>,
) {
    for &(df, dr) in steps {
        if let Some(to) = from.offset(df, dr) {
            if board.piece_at(to).is_none_or(|piece| piece.color != color) {
                moves.push(ChessMove::new(from, to));
            }
        }
    }
}

fn slide_moves(
    board: &ChessBoard,
    from: Square,
    color: Color,
    dirs: &[(i8, i8)],
    moves: &mut Vec<ChessMove>,
) {
    for &(df, dr) in dirs {
        let mut current = from.offset(df, dr);
        while let Some(to) = current {
            match board.piece_at(to) {
                None => moves.push(ChessMove::new(from, to)),
                Some(piece) => {
                    if piece.color != color {
                        moves.push(ChessMove::new(from, to));
                    }
                    break;
                }
            }
            current = to.offset(df, dr);
        }
    }
}

fn castle_moves(board: &ChessBoard, from: Square, color: Color, moves: &mut Vec<ChessMove>) {
    let rank = home_rank(color);
    if from.rank() != rank || from.file() != 4 {
        return;
    }
    let enemy = color.opponent();
    if is_attacked(board, from, enemy) {
        return;
    }

    let rook = Some(Piece::new(color, PieceKind::Rook));
    let empty = |file: u8| Square::new(file, rank).is_some_and(|sq| board.piece_at(sq).is_none());
    let safe = |file: u8| Square::new(file, rank).is_some_and(|sq| !is_attacked(board, sq, enemy));
    let rook_on = |file: u8| Square::new(file, rank).and_then(|sq| board.piece_at(sq)) == rook;

    if board.castling().allows(color, CastleSide::Kingside)
        && rook_on(7)
        && empty(5)
        && empty(6)
        && safe(5)
        && safe(6)
    {
        if let Some(to) = Square::new(6, rank) {
            moves.push(ChessMove::new(from, to));
        }
    }

    if board.castling().allows(color, CastleSide::Queenside)
        && rook_on(0)
        && empty(1)
        && empty(2)
        && empty(3)
        && safe(2)
        && safe(3)
    {
        if let Some(to) = Square::new(2, rank) {
            moves.push(ChessMove::new(from, to));
        }
    }
}

/// Plays `mv` without legality checks, returning the resulting board.
///
/// Returns `None` if there is no piece on the origin square.
pub(crate) fn apply(board: &ChessBoard, mv: &ChessMove) -> Option<ChessBoard> {
    let piece = board.piece_at(mv.from)?;
    let details = board.details(mv);
    let mut next = board.clone();
    let color = piece.color;

    if details.en_passant {
        if let Some(captured) = Square::new(mv.to.file(), mv.from.rank()) {
            next.set(captured, None);
        }
    }

    next.set(mv.from, None);
    let placed = match mv.promotion {
        Some(kind) if piece.kind == PieceKind::Pawn => Piece::new(color, kind),
        _ => piece,
    };
    next.set(mv.to, Some(placed));

    if let Some(side) = details.castle {
        let rank = mv.from.rank();
        let (rook_from, rook_to) = match side {
            CastleSide::Kingside => (Square::new(7, rank), Square::new(5, rank)),
            CastleSide::Queenside => (Square::new(0, rank), Square::new(3, rank)),
        };
        if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
            let rook = next.piece_at(rook_from);
            next.set(rook_from, None);
            next.set(rook_to, rook);
        }
    }

    if piece.kind == PieceKind::King {
        next.castling_mut().revoke(color, CastleSide::Kingside);
        next.castling_mut().revoke(color, CastleSide::Queenside);
    }
    for square in [mv.from, mv.to] {
        for owner in [Color::White, Color::Black] {
            let rank = home_rank(owner);
            if square.rank() == rank && square.file() == 0 {
                next.castling_mut().revoke(owner, CastleSide::Queenside);
            }
            if square.rank() == rank && square.file() == 7 {
                next.castling_mut().revoke(owner, CastleSide::Kingside);
            }
        }
    }

    let en_passant = if details.double_push {
        mv.from.offset(0, pawn_direction(color))
    } else {
        None
    };
    let reset_clock = piece.kind == PieceKind::Pawn || details.capture.is_some();
    next.finish_move(en_passant, reset_clock);
    Some(next)
}

/// Fully legal moves for the side to move.
pub(crate) fn legal_moves(board: &ChessBoard) -> Vec<ChessMove> {
    let color = board.side_to_move();
    pseudo_legal_moves(board)
        .into_iter()
        .filter(|mv| apply(board, mv).is_some_and(|next| !next.is_in_check(color)))
        .collect()
}
