//! Board coordinates.
//!
//! All rules logic operates on canonical (white-perspective) coordinates:
//! row 0 is the black back rank, row 7 the white back rank. The viewer
//! transform exists purely for rendering and must never be applied before
//! legality computation.

use serde::{Deserialize, Serialize};

use super::piece::Color;

/// A square on the 8x8 board, in canonical coordinates.
///
/// Stored as `i8` so movement deltas can be applied without casts;
/// out-of-range values are rejected by [`Position::is_valid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    /// Create a position. No bounds check; pair with [`Position::is_valid`].
    #[must_use]
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// Whether this position lies on the board.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        is_valid_square(self.row, self.col)
    }

    /// This position shifted by a movement delta. May leave the board.
    #[must_use]
    pub const fn offset(self, d_row: i8, d_col: i8) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// Coordinates as seen by a viewer of the given color.
    ///
    /// White viewers see canonical coordinates; black viewers see both
    /// axes flipped. Rendering only.
    #[must_use]
    pub const fn for_viewer(self, viewer: Color) -> Self {
        match viewer {
            Color::White => self,
            Color::Black => Self::new(7 - self.row, 7 - self.col),
        }
    }

    /// Algebraic file letter (`a`..`h`), by column.
    #[must_use]
    pub fn file_char(self) -> char {
        (b'a' + self.col as u8) as char
    }

    /// Algebraic rank digit (`8`..`1`), by row.
    #[must_use]
    pub fn rank_char(self) -> char {
        (b'8' - self.row as u8) as char
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// Bounds check for `[0,7] x [0,7]`.
#[must_use]
pub const fn is_valid_square(row: i8, col: i8) -> bool {
    row >= 0 && row < 8 && col >= 0 && col < 8
}
