//! Core board-model types: coordinates, pieces, the board grid, game state.
//!
//! Everything here is canonical-orientation data with no rules knowledge;
//! move legality lives in `crate::rules`.

pub mod board;
pub mod piece;
pub mod position;
pub mod state;

pub use board::{Board, RulesError};
pub use piece::{Color, Piece, Role};
pub use position::{is_valid_square, Position};
pub use state::{GameState, Move, PromotionState, TimeControl};
