//! Legality filtering: en passant, castling, and self-check exclusion.
//!
//! Every pseudo-legal candidate is simulated on a board copy and discarded
//! if the mover's own king ends up attacked. That single rule applies
//! uniformly, including to castling moves, whose transit-through-check
//! cases are already excluded upstream by `can_castle`.

use crate::core::{Board, Color, Move, Position, Role, RulesError};
use super::check::is_in_check;
use super::movegen::{attack_moves, MoveList};

/// Whether `from -> to` by a pawn of `color` is an en-passant capture,
/// given the previous ply.
///
/// Legal only in the one-ply window immediately after the opposing pawn's
/// two-square advance to the adjacent file.
#[must_use]
pub fn is_en_passant_capture(from: Position, to: Position, last_move: &Move, color: Color) -> bool {
    // The capturing pawn must stand on its fixed en-passant rank.
    if from.row != color.en_passant_rank() {
        return false;
    }

    // The last ply must be an opposing pawn's two-square advance.
    let last_piece = last_move.piece;
    if last_piece.role != Role::Pawn || last_piece.color != color.opposite() {
        return false;
    }
    if (last_move.to.row - last_move.from.row).abs() != 2 {
        return false;
    }

    // That pawn must have landed beside the capturer, on the capture file.
    if last_move.to.col != to.col || last_move.to.row != from.row {
        return false;
    }
    if (from.col - last_move.to.col).abs() != 1 {
        return false;
    }

    to.row == from.row + color.forward()
}

/// The rook relocation implied by a two-column king move, as
/// `(rook_from, rook_to)`. `None` when the king move is not a castle.
#[must_use]
pub fn rook_castling_move(king_from: Position, king_to: Position) -> Option<(Position, Position)> {
    if (king_to.col - king_from.col).abs() != 2 {
        return None;
    }

    let row = king_from.row;
    let kingside = king_to.col > king_from.col;
    let rook_from = Position::new(row, if kingside { 7 } else { 0 });
    let rook_to = Position::new(row, if kingside { king_to.col - 1 } else { king_to.col + 1 });
    Some((rook_from, rook_to))
}

/// Whether the king may castle with the rook on `rook_position`.
///
/// Requires both pieces present and unmoved, a clear path between them,
/// the king not currently in check, and no square the king passes over or
/// lands on attacked while the king hypothetically stands there. The
/// attacked-square scan runs from the king toward the rook, excluding the
/// origin (covered by the in-check test) and the rook's own column.
#[must_use]
pub fn can_castle(
    king_position: Position,
    rook_position: Position,
    board: &Board,
    color: Color,
) -> bool {
    let (Some(king), Some(rook)) = (board.get(king_position), board.get(rook_position)) else {
        return false;
    };
    if king.has_moved || rook.has_moved {
        return false;
    }
    if king.role != Role::King || king.color != color || rook.role != Role::Rook || rook.color != color
    {
        return false;
    }

    // Clear path strictly between king and rook.
    let row = king_position.row;
    let (low, high) = if king_position.col < rook_position.col {
        (king_position.col, rook_position.col)
    } else {
        (rook_position.col, king_position.col)
    };
    for col in (low + 1)..high {
        if board.get(Position::new(row, col)).is_some() {
            return false;
        }
    }

    if is_in_check(king_position, board, color) {
        return false;
    }

    // No transited square may be attacked with the king placed on it.
    let step = if rook_position.col < king_position.col { -1 } else { 1 };
    let mut col = king_position.col + step;
    while col != rook_position.col {
        let target = Position::new(row, col);
        let mut sim = *board;
        sim.set(king_position, None);
        sim.set(target, Some(king));
        if is_in_check(target, &sim, color) {
            return false;
        }
        col += step;
    }

    true
}

/// Castling destinations for an unmoved king: kingside against the rook
/// on column 7, queenside against column 0, checked independently.
#[must_use]
pub fn castling_moves(king_position: Position, board: &Board, color: Color) -> MoveList {
    let mut moves = MoveList::new();
    let row = color.back_rank();

    let kingside_rook = Position::new(row, 7);
    if can_castle(king_position, kingside_rook, board, color) {
        moves.push(Position::new(row, king_position.col + 2));
    }

    let queenside_rook = Position::new(row, 0);
    if can_castle(king_position, queenside_rook, board, color) {
        moves.push(Position::new(row, king_position.col - 2));
    }

    moves
}

/// Legal destinations for the piece at `position`.
///
/// Pseudo-legal moves, plus castling candidates for an unmoved king, each
/// simulated on a board copy (with the rook relocated for castling) and
/// kept only if the mover's king (tracked at its new square when the
/// king itself moved) is not attacked afterwards.
pub fn legal_moves(
    position: Position,
    board: &Board,
    last_move: Option<&Move>,
) -> Result<MoveList, RulesError> {
    let Some(piece) = board.get(position) else {
        return Ok(MoveList::new());
    };

    let mut candidates = attack_moves(position, board, last_move);
    if piece.role == Role::King && !piece.has_moved {
        candidates.extend(castling_moves(position, board, piece.color));
    }

    let mut legal = MoveList::new();
    for target in candidates {
        let mut sim = *board;

        if piece.role == Role::King {
            if let Some((rook_from, rook_to)) = rook_castling_move(position, target) {
                let rook = sim.get(rook_from);
                sim.set(rook_to, rook);
                sim.set(rook_from, None);
            }
        }
        sim.set(target, Some(piece));
        sim.set(position, None);

        let king = if piece.role == Role::King {
            target
        } else {
            sim.find_king(piece.color)?
        };
        if !is_in_check(king, &sim, piece.color) {
            legal.push(target);
        }
    }

    Ok(legal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Piece;

    fn board_with(pieces: &[(Position, Piece)]) -> Board {
        let mut board = Board::empty();
        for &(pos, piece) in pieces {
            board.set(pos, Some(piece));
        }
        board
    }

    fn two_square_advance(color: Color, col: i8) -> Move {
        let (from_row, to_row) = match color {
            Color::White => (6, 4),
            Color::Black => (1, 3),
        };
        Move::plain(
            Position::new(from_row, col),
            Position::new(to_row, col),
            Piece::new(Role::Pawn, color),
        )
    }

    #[test]
    fn test_en_passant_window() {
        let from = Position::new(3, 1);
        let to = Position::new(2, 0);
        let last = two_square_advance(Color::Black, 0);

        assert!(is_en_passant_capture(from, to, &last, Color::White));

        // One ply later the window is closed: the last move is no longer
        // the double advance.
        let unrelated = Move::plain(
            Position::new(0, 1),
            Position::new(2, 2),
            Piece::new(Role::Knight, Color::Black),
        );
        assert!(!is_en_passant_capture(from, to, &unrelated, Color::White));
    }

    #[test]
    fn test_en_passant_wrong_rank() {
        let last = two_square_advance(Color::Black, 0);
        assert!(!is_en_passant_capture(
            Position::new(4, 1),
            Position::new(3, 0),
            &last,
            Color::White
        ));
    }

    #[test]
    fn test_en_passant_not_adjacent_file() {
        let last = two_square_advance(Color::Black, 0);
        assert!(!is_en_passant_capture(
            Position::new(3, 3),
            Position::new(2, 0),
            &last,
            Color::White
        ));
    }

    #[test]
    fn test_en_passant_single_advance_does_not_qualify() {
        let last = Move::plain(
            Position::new(2, 0),
            Position::new(3, 0),
            Piece::new(Role::Pawn, Color::Black),
        );
        assert!(!is_en_passant_capture(
            Position::new(3, 1),
            Position::new(2, 0),
            &last,
            Color::White
        ));
    }

    fn castling_board() -> Board {
        board_with(&[
            (Position::new(7, 4), Piece::new(Role::King, Color::White)),
            (Position::new(7, 7), Piece::new(Role::Rook, Color::White)),
            (Position::new(7, 0), Piece::new(Role::Rook, Color::White)),
            (Position::new(0, 4), Piece::new(Role::King, Color::Black)),
        ])
    }

    #[test]
    fn test_can_castle_both_sides() {
        let board = castling_board();
        let king = Position::new(7, 4);

        assert!(can_castle(king, Position::new(7, 7), &board, Color::White));
        assert!(can_castle(king, Position::new(7, 0), &board, Color::White));

        let moves = castling_moves(king, &board, Color::White);
        assert!(moves.contains(&Position::new(7, 6)));
        assert!(moves.contains(&Position::new(7, 2)));
    }

    #[test]
    fn test_cannot_castle_after_king_moved() {
        let mut board = castling_board();
        board.mark_moved(Position::new(7, 4));
        assert!(!can_castle(
            Position::new(7, 4),
            Position::new(7, 7),
            &board,
            Color::White
        ));
    }

    #[test]
    fn test_cannot_castle_through_occupied_square() {
        let mut board = castling_board();
        board.set(
            Position::new(7, 5),
            Some(Piece::new(Role::Bishop, Color::White)),
        );
        assert!(!can_castle(
            Position::new(7, 4),
            Position::new(7, 7),
            &board,
            Color::White
        ));
        // Queenside path is still clear.
        assert!(can_castle(
            Position::new(7, 4),
            Position::new(7, 0),
            &board,
            Color::White
        ));
    }

    #[test]
    fn test_cannot_castle_while_in_check() {
        let mut board = castling_board();
        board.set(
            Position::new(4, 4),
            Some(Piece::new(Role::Rook, Color::Black)),
        );
        assert!(!can_castle(
            Position::new(7, 4),
            Position::new(7, 7),
            &board,
            Color::White
        ));
    }

    #[test]
    fn test_cannot_castle_through_attacked_square() {
        let mut board = castling_board();
        // Black rook eyes f1, the square the king passes over.
        board.set(
            Position::new(4, 5),
            Some(Piece::new(Role::Rook, Color::Black)),
        );
        assert!(!can_castle(
            Position::new(7, 4),
            Position::new(7, 7),
            &board,
            Color::White
        ));
    }

    #[test]
    fn test_legal_moves_exclude_self_check() {
        // The bishop is pinned to its king by a rook; it may not move.
        let board = board_with(&[
            (Position::new(7, 4), Piece::new(Role::King, Color::White)),
            (Position::new(5, 4), Piece::new(Role::Bishop, Color::White)),
            (Position::new(0, 4), Piece::new(Role::Rook, Color::Black)),
            (Position::new(0, 0), Piece::new(Role::King, Color::Black)),
        ]);

        let moves = legal_moves(Position::new(5, 4), &board, None).unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn test_king_cannot_step_into_attack() {
        let board = board_with(&[
            (Position::new(7, 4), Piece::new(Role::King, Color::White)),
            (Position::new(0, 3), Piece::new(Role::Rook, Color::Black)),
            (Position::new(0, 0), Piece::new(Role::King, Color::Black)),
        ]);

        let moves = legal_moves(Position::new(7, 4), &board, None).unwrap();
        assert!(!moves.contains(&Position::new(7, 3)));
        assert!(!moves.contains(&Position::new(6, 3)));
        assert!(moves.contains(&Position::new(7, 5)));
    }

    #[test]
    fn test_rook_castling_move_geometry() {
        // Kingside: rook h1 -> f1.
        assert_eq!(
            rook_castling_move(Position::new(7, 4), Position::new(7, 6)),
            Some((Position::new(7, 7), Position::new(7, 5)))
        );
        // Queenside: rook a1 -> d1.
        assert_eq!(
            rook_castling_move(Position::new(7, 4), Position::new(7, 2)),
            Some((Position::new(7, 0), Position::new(7, 3)))
        );
        // A one-column king step is not a castle.
        assert_eq!(
            rook_castling_move(Position::new(7, 4), Position::new(7, 5)),
            None
        );
    }
}
