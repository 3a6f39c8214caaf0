//! Pseudo-legal move generation.
//!
//! Movement is table-driven: each line-moving role maps to a direction
//! set plus a sliding/stepping flag, so dispatch is an exhaustive match
//! over the closed `Role` enumeration.
//!
//! `attack_moves` produces the squares a piece could move to or capture
//! on, ignoring whether the mover's own king ends up attacked; that
//! filter is `rules::legality::legal_moves`. Castling candidates are not
//! attacks and are generated separately in `rules::legality`.

use smallvec::SmallVec;

use crate::core::{Board, Move, Position, Role};
use super::legality::is_en_passant_capture;

/// Destination list. Inline capacity covers every role except a
/// centralized queen, which spills.
pub type MoveList = SmallVec<[Position; 16]>;

/// Direction set plus sliding/stepping flag for a line-moving role.
struct MovePattern {
    directions: &'static [(i8, i8)],
    sliding: bool,
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, -1), (1, -1), (-1, 1)];
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Movement table for the line movers; knights and pawns are handled
/// by their own generators.
const fn line_pattern(role: Role) -> Option<MovePattern> {
    match role {
        Role::King => Some(MovePattern {
            directions: &ALL_DIRECTIONS,
            sliding: false,
        }),
        Role::Rook => Some(MovePattern {
            directions: &ORTHOGONAL,
            sliding: true,
        }),
        Role::Bishop => Some(MovePattern {
            directions: &DIAGONAL,
            sliding: true,
        }),
        Role::Queen => Some(MovePattern {
            directions: &ALL_DIRECTIONS,
            sliding: true,
        }),
        Role::Pawn | Role::Knight => None,
    }
}

/// Pseudo-legal destinations for the piece at `position`.
///
/// Pure function of the board and, for pawn en-passant captures, the
/// previous ply. Returns empty when the square is empty.
#[must_use]
pub fn attack_moves(position: Position, board: &Board, last_move: Option<&Move>) -> MoveList {
    let mut moves = MoveList::new();
    let Some(piece) = board.get(position) else {
        return moves;
    };

    if let Some(pattern) = line_pattern(piece.role) {
        for &(d_row, d_col) in pattern.directions {
            let mut target = position.offset(d_row, d_col);
            while target.is_valid() {
                let occupant = board.get(target);
                if occupant.is_some_and(|p| p.color == piece.color) {
                    break;
                }
                moves.push(target);
                if occupant.is_some() || !pattern.sliding {
                    break;
                }
                target = target.offset(d_row, d_col);
            }
        }
        return moves;
    }

    match piece.role {
        Role::Knight => {
            for &(d_row, d_col) in &KNIGHT_OFFSETS {
                let target = position.offset(d_row, d_col);
                if target.is_valid() && !board.get(target).is_some_and(|p| p.color == piece.color) {
                    moves.push(target);
                }
            }
        }
        Role::Pawn => {
            let forward = piece.color.forward();

            // Forward pushes require empty squares.
            let one_ahead = position.offset(forward, 0);
            if one_ahead.is_valid() && board.get(one_ahead).is_none() {
                moves.push(one_ahead);

                let two_ahead = position.offset(2 * forward, 0);
                if position.row == piece.color.pawn_start_rank()
                    && two_ahead.is_valid()
                    && board.get(two_ahead).is_none()
                {
                    moves.push(two_ahead);
                }
            }

            // Diagonal captures, including en passant.
            for d_col in [-1, 1] {
                let target = position.offset(forward, d_col);
                if !target.is_valid() {
                    continue;
                }
                let occupant = board.get(target);
                if occupant.is_some_and(|p| p.color != piece.color) {
                    moves.push(target);
                } else if occupant.is_none()
                    && last_move
                        .is_some_and(|last| is_en_passant_capture(position, target, last, piece.color))
                {
                    moves.push(target);
                }
            }
        }
        // Line movers returned above.
        _ => {}
    }

    moves
}
