//! The move-legality engine.
//!
//! Layered leaves-first: `movegen` produces pseudo-legal destinations,
//! `check` asks whether a king is attacked, `legality` filters out moves
//! that leave the mover's own king attacked, `apply` executes a complete
//! ply, and `notation` renders its textual record. Everything is a pure
//! function over the board; simulation always happens on a copy.

pub mod apply;
pub mod check;
pub mod legality;
pub mod movegen;
pub mod notation;

pub use apply::{apply_ply, execute_move, is_promotion_move, king_in_check, undo_last_ply};
pub use check::{is_checkmate, is_in_check};
pub use legality::{can_castle, castling_moves, is_en_passant_capture, legal_moves, rook_castling_move};
pub use movegen::{attack_moves, MoveList};
