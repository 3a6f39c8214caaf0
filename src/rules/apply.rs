//! Move execution and full ply application.
//!
//! `execute_move` is the pure board transform: copy, relocate the castling
//! rook when a king travels two columns, move the piece. Everything else a
//! ply entails (en-passant removal, `has_moved` flagging, promotion
//! substitution, check derivation, notation, history bookkeeping) lives
//! in `apply_ply`, which is the single code path both the local-optimistic
//! and the remote-replicated sides go through. Given the same pre-move
//! state and move tuple it produces bit-identical results, which is the
//! protocol's only defense against divergence.

use log::debug;

use crate::core::{Color, GameState, Move, Piece, Position, Role, RulesError};
use super::check::{is_checkmate, is_in_check};
use super::legality::{is_en_passant_capture, rook_castling_move};
use super::notation;
use crate::core::Board;

/// Apply `from -> to` to a copy of the board and return it.
///
/// Relocates the rook when the moved piece is a king advancing two
/// columns. Does not infer capture-by-passing or flag `has_moved`; the
/// caller (`apply_ply`) owns those.
#[must_use]
pub fn execute_move(from: Position, to: Position, board: &Board) -> Board {
    let mut next = *board;
    let piece = next.get(from);

    if let Some(p) = piece {
        if p.role == Role::King {
            if let Some((rook_from, rook_to)) = rook_castling_move(from, to) {
                let rook = next.get(rook_from);
                next.set(rook_to, rook);
                next.set(rook_from, None);
            }
        }
    }

    next.set(to, piece);
    next.set(from, None);
    next
}

/// Whether a pawn move to `to` requires promotion before the ply is
/// complete.
#[must_use]
pub fn is_promotion_move(piece: Piece, to: Position) -> bool {
    piece.role == Role::Pawn && to.row == piece.color.promotion_rank()
}

/// Execute one complete ply against `state` and return its record.
///
/// Handles capture (including en passant removal), castling, the
/// `has_moved` flag, promotion substitution when `promotion` is given,
/// check/checkmate re-derivation for the side now to move, notation, and
/// the history/turn bookkeeping. Deterministic: no hidden state.
pub fn apply_ply(
    state: &mut GameState,
    from: Position,
    to: Position,
    promotion: Option<Role>,
) -> Result<Move, RulesError> {
    let piece = state.board.get(from).ok_or(RulesError::NoPieceAt(from))?;
    let mut captured = state.board.get(to);

    let mut next = execute_move(from, to, &state.board);

    let is_en_passant = piece.role == Role::Pawn
        && state
            .last_move
            .as_ref()
            .is_some_and(|last| is_en_passant_capture(from, to, last, piece.color));
    if is_en_passant {
        if let Some(last) = &state.last_move {
            captured = next.get(last.to);
            next.set(last.to, None);
        }
    }

    let is_castle = piece.role == Role::King && (to.col - from.col).abs() == 2;
    next.mark_moved(to);

    let moved = match promotion {
        Some(role) => {
            let promoted = Piece {
                role,
                color: piece.color,
                has_moved: true,
            };
            next.set(to, Some(promoted));
            promoted
        }
        None => piece,
    };

    // Re-derive check and checkmate for the side now to move; peer-sent
    // flags are never consulted.
    let opponent = piece.color.opposite();
    let king = next.find_king(opponent)?;
    let check = is_in_check(king, &next, opponent);
    let mate = check && is_checkmate(king, &next, opponent)?;

    let text = if promotion.is_some() {
        notation::promotion_notation(moved, to, check, mate)
    } else {
        notation::move_notation(piece, from, to, check, mate)
    };
    debug!("applied ply {text} ({} to move)", opponent);

    let record = Move {
        from,
        to,
        piece,
        captured,
        is_castle,
        is_en_passant,
        promotion,
    };

    state.board = next;
    state.move_history.push_back(text);
    state.board_history.push_back(state.board);
    state.current_player = opponent;
    state.last_move = Some(record);
    state.clear_selection();
    state.is_check = check;
    state.is_checkmate = mate;
    if mate {
        state.is_game_over = true;
    }

    Ok(record)
}

/// Roll back the most recent ply, restoring the previous board snapshot.
///
/// Used when an undo request is accepted. The en-passant window of the
/// rolled-back-to position is not reconstructed (`last_move` becomes
/// `None`). Returns `false` when there is nothing to undo.
pub fn undo_last_ply(state: &mut GameState) -> Result<bool, RulesError> {
    if state.move_history.is_empty() {
        return Ok(false);
    }

    state.move_history.pop_back();
    if state.board_history.len() > 1 {
        state.board_history.pop_back();
    }
    state.board = state
        .board_history
        .back()
        .copied()
        .unwrap_or_else(Board::standard);
    state.current_player = state.current_player.opposite();
    state.last_move = None;
    state.clear_selection();

    let king = state.board.find_king(state.current_player)?;
    state.is_check = is_in_check(king, &state.board, state.current_player);
    state.is_checkmate = false;
    state.is_game_over = false;
    Ok(true)
}

/// Convenience used by display code: whether the king of `color` is
/// currently attacked on `state`'s board.
pub fn king_in_check(state: &GameState, color: Color) -> Result<bool, RulesError> {
    let king = state.board.find_king(color)?;
    Ok(is_in_check(king, &state.board, color))
}
