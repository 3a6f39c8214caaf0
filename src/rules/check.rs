//! Check and checkmate oracle.

use crate::core::{Board, Color, Position, RulesError};
use super::movegen::attack_moves;

/// Whether the king on `king_position` is attacked by any opposing piece.
///
/// Cost is proportional to board occupancy (at most 32 pieces); no
/// incremental attack maps are kept at this scale. En passant never
/// attacks a king, so the last ply is not consulted.
#[must_use]
pub fn is_in_check(king_position: Position, board: &Board, color: Color) -> bool {
    let opponent = color.opposite();
    board
        .pieces()
        .filter(|(_, piece)| piece.color == opponent)
        .any(|(pos, _)| attack_moves(pos, board, None).contains(&king_position))
}

/// Whether `color` is checkmated.
///
/// False immediately when not in check. Otherwise every pseudo-legal
/// reply is simulated on a board copy, recomputing the king's square when
/// the king itself moved; mate means none of them leaves the king safe.
///
/// A side with no legal move that is *not* in check is not classified
/// here; stalemate is not a terminal condition in this engine.
pub fn is_checkmate(king_position: Position, board: &Board, color: Color) -> Result<bool, RulesError> {
    if !is_in_check(king_position, board, color) {
        return Ok(false);
    }

    for (pos, piece) in board.pieces().filter(|(_, p)| p.color == color) {
        for target in attack_moves(pos, board, None) {
            let mut sim = *board;
            sim.set(target, Some(piece));
            sim.set(pos, None);

            let king = sim.find_king(color)?;
            if !is_in_check(king, &sim, color) {
                return Ok(false);
            }
        }
    }

    Ok(true)
}
