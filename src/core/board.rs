//! The 8x8 board grid.
//!
//! A [`Board`] is a plain value: cheap to copy, compared bit-for-bit in
//! the synchronization tests. Rules code never mutates a board under
//! evaluation in place; it simulates on a copy and discards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::piece::{Color, Piece, Role};
use super::position::Position;

/// Fatal rules-engine conditions.
///
/// These are invariant violations, not normal game outcomes: the engine
/// refuses to proceed rather than return a wrong answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RulesError {
    /// No king of the given color on the board.
    #[error("{0} king not found on board")]
    KingNotFound(Color),
    /// A move referenced an empty square.
    #[error("no piece at {0}")]
    NoPieceAt(Position),
}

/// 8x8 grid of optional pieces, canonical orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board([[Option<Piece>; 8]; 8]);

impl Board {
    /// An empty board.
    #[must_use]
    pub const fn empty() -> Self {
        Self([[None; 8]; 8])
    }

    /// The standard starting position.
    #[must_use]
    pub fn standard() -> Self {
        const BACK_RANK: [Role; 8] = [
            Role::Rook,
            Role::Knight,
            Role::Bishop,
            Role::Queen,
            Role::King,
            Role::Bishop,
            Role::Knight,
            Role::Rook,
        ];

        let mut board = Self::empty();
        for (col, &role) in BACK_RANK.iter().enumerate() {
            let col = col as i8;
            board.set(Position::new(0, col), Some(Piece::new(role, Color::Black)));
            board.set(Position::new(1, col), Some(Piece::new(Role::Pawn, Color::Black)));
            board.set(Position::new(6, col), Some(Piece::new(Role::Pawn, Color::White)));
            board.set(Position::new(7, col), Some(Piece::new(role, Color::White)));
        }
        board
    }

    /// Piece at a square. The position must be on the board.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<Piece> {
        debug_assert!(position.is_valid());
        self.0[position.row as usize][position.col as usize]
    }

    /// Place (or clear) a square. The position must be on the board.
    pub fn set(&mut self, position: Position, piece: Option<Piece>) {
        debug_assert!(position.is_valid());
        self.0[position.row as usize][position.col as usize] = piece;
    }

    /// Set `has_moved` on the piece at a square, if any.
    pub fn mark_moved(&mut self, position: Position) {
        if let Some(piece) = &mut self.0[position.row as usize][position.col as usize] {
            piece.has_moved = true;
        }
    }

    /// Iterate over all occupied squares.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        (0..8i8).flat_map(move |row| {
            (0..8i8).filter_map(move |col| {
                let pos = Position::new(row, col);
                self.get(pos).map(|piece| (pos, piece))
            })
        })
    }

    /// Locate the king of a color.
    ///
    /// Absence is a fatal invariant violation, never a normal outcome.
    pub fn find_king(&self, color: Color) -> Result<Position, RulesError> {
        self.pieces()
            .find(|(_, piece)| piece.role == Role::King && piece.color == color)
            .map(|(pos, _)| pos)
            .ok_or(RulesError::KingNotFound(color))
    }

    /// The board as a viewer of the given color sees it.
    ///
    /// Black viewers get both axes flipped. Rendering only; rules always
    /// operate on the canonical board.
    #[must_use]
    pub fn display(&self, viewer: Color) -> Self {
        match viewer {
            Color::White => *self,
            Color::Black => {
                let mut flipped = Self::empty();
                for row in 0..8i8 {
                    for col in 0..8i8 {
                        let pos = Position::new(row, col);
                        flipped.set(pos.for_viewer(Color::Black), self.get(pos));
                    }
                }
                flipped
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
