//! Game state: the board plus everything a client tracks between plies.
//!
//! ## GameState
//!
//! One mutable cell per client, owned by the synchronizer, read by the UI
//! and the rules components, written only through the executor paths in
//! `rules::apply`. History uses `im` persistent vectors so each applied
//! ply snapshots the board in O(1).
//!
//! ## Invariants
//!
//! - `move_history.len() == board_history.len() - 1`
//! - `current_player` flips exactly once per successfully executed ply
//! - `possible_moves` is non-empty only while one of the current player's
//!   pieces is selected

use im::Vector;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::piece::{Color, Piece, Role};
use super::position::Position;

/// The minimal transmissible description of a ply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    /// The moving piece, as it stood before the move.
    pub piece: Piece,
    /// Captured piece, including the pawn removed by en passant.
    pub captured: Option<Piece>,
    pub is_castle: bool,
    pub is_en_passant: bool,
    /// Role the pawn was replaced with, when the ply promoted.
    pub promotion: Option<Role>,
}

impl Move {
    /// A plain move with no capture or special flags, as used for
    /// last-move tracking in tests and simulations.
    #[must_use]
    pub const fn plain(from: Position, to: Position, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured: None,
            is_castle: false,
            is_en_passant: false,
            promotion: None,
        }
    }
}

/// Clock settings. Present in the data model; no clock behavior is
/// implemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// Remaining seconds for white.
    pub white: u32,
    /// Remaining seconds for black.
    pub black: u32,
    /// Increment per move, seconds.
    pub increment: u32,
}

/// Per-client game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub current_player: Color,
    /// Notation strings, one per executed ply.
    pub move_history: Vector<String>,
    pub selected_square: Option<Position>,
    pub possible_moves: FxHashSet<Position>,
    pub last_move: Option<Move>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_game_over: bool,
    /// Board snapshots: the initial position plus one per executed ply.
    pub board_history: Vector<Board>,
    pub time_control: Option<TimeControl>,
}

impl GameState {
    /// The standard starting position, white to move.
    #[must_use]
    pub fn new() -> Self {
        let board = Board::standard();
        let mut board_history = Vector::new();
        board_history.push_back(board);

        Self {
            board,
            current_player: Color::White,
            move_history: Vector::new(),
            selected_square: None,
            possible_moves: FxHashSet::default(),
            last_move: None,
            is_check: false,
            is_checkmate: false,
            is_game_over: false,
            board_history,
            time_control: None,
        }
    }

    /// Select a square and publish its legal destinations.
    pub fn select(&mut self, position: Position, moves: impl IntoIterator<Item = Position>) {
        self.selected_square = Some(position);
        self.possible_moves = moves.into_iter().collect();
    }

    /// Drop any selection and its published destinations.
    pub fn clear_selection(&mut self) {
        self.selected_square = None;
        self.possible_moves.clear();
    }

    /// Number of executed plies.
    #[must_use]
    pub fn ply_count(&self) -> usize {
        self.move_history.len()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient promotion dialog state.
///
/// Exists only between a pawn reaching the last rank and the player
/// choosing a replacement role; cleared immediately after resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionState {
    pub is_promoting: bool,
    /// Square the pawn is promoting on.
    pub position: Option<Position>,
    /// The promoting pawn.
    pub piece: Option<Piece>,
}

impl PromotionState {
    /// No promotion pending.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            is_promoting: false,
            position: None,
            piece: None,
        }
    }

    /// A promotion awaiting the player's role choice.
    #[must_use]
    pub const fn pending(position: Position, piece: Piece) -> Self {
        Self {
            is_promoting: true,
            position: Some(position),
            piece: Some(piece),
        }
    }
}
