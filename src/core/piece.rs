//! Piece roles, colors, and glyphs.
//!
//! Roles form a closed enumeration; the twelve unicode glyphs remain the
//! notation and display surface but are never matched on for movement
//! dispatch (that goes through the role-indexed tables in `rules::movegen`).

use serde::{Deserialize, Serialize};

/// Side to move / piece ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row this color's back rank occupies.
    #[must_use]
    pub const fn back_rank(self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row this color's pawns start on.
    #[must_use]
    pub const fn pawn_start_rank(self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row a pawn of this color promotes on.
    #[must_use]
    pub const fn promotion_rank(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row a pawn of this color must stand on to capture en passant.
    #[must_use]
    pub const fn en_passant_rank(self) -> i8 {
        match self {
            Color::White => 3,
            Color::Black => 4,
        }
    }

    /// Forward direction along rows (-1 for white, +1 for black).
    #[must_use]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Piece role. Movement patterns are looked up by role in `rules::movegen`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Role {
    /// Roles a pawn may promote to, in the order the selection dialog
    /// presents them.
    pub const PROMOTION_CHOICES: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];
}

/// A piece on the board.
///
/// `has_moved` is meaningful only for kings and rooks, where it gates
/// castling; it is tracked for every piece because the executor flags the
/// destination square uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub role: Role,
    pub color: Color,
    #[serde(default)]
    pub has_moved: bool,
}

impl Piece {
    /// A piece that has not moved yet.
    #[must_use]
    pub const fn new(role: Role, color: Color) -> Self {
        Self {
            role,
            color,
            has_moved: false,
        }
    }

    /// The unicode glyph for this piece, as used in move notation.
    #[must_use]
    pub const fn glyph(self) -> char {
        match (self.color, self.role) {
            (Color::White, Role::King) => '♔',
            (Color::White, Role::Queen) => '♕',
            (Color::White, Role::Rook) => '♖',
            (Color::White, Role::Bishop) => '♗',
            (Color::White, Role::Knight) => '♘',
            (Color::White, Role::Pawn) => '♙',
            (Color::Black, Role::King) => '♚',
            (Color::Black, Role::Queen) => '♛',
            (Color::Black, Role::Rook) => '♜',
            (Color::Black, Role::Bishop) => '♝',
            (Color::Black, Role::Knight) => '♞',
            (Color::Black, Role::Pawn) => '♟',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn test_color_geometry() {
        assert_eq!(Color::White.pawn_start_rank(), 6);
        assert_eq!(Color::Black.pawn_start_rank(), 1);
        assert_eq!(Color::White.en_passant_rank(), 3);
        assert_eq!(Color::Black.en_passant_rank(), 4);
        assert_eq!(Color::White.forward(), -1);
        assert_eq!(Color::Black.forward(), 1);
        assert_eq!(Color::White.promotion_rank(), 0);
        assert_eq!(Color::Black.promotion_rank(), 7);
    }

    #[test]
    fn test_glyphs_are_distinct() {
        use std::collections::HashSet;

        let mut glyphs = HashSet::new();
        for color in [Color::White, Color::Black] {
            for role in [
                Role::Pawn,
                Role::Knight,
                Role::Bishop,
                Role::Rook,
                Role::Queen,
                Role::King,
            ] {
                glyphs.insert(Piece::new(role, color).glyph());
            }
        }
        assert_eq!(glyphs.len(), 12);
    }

    #[test]
    fn test_piece_serialization() {
        let piece = Piece::new(Role::Knight, Color::Black);
        let json = serde_json::to_string(&piece).unwrap();
        let back: Piece = serde_json::from_str(&json).unwrap();
        assert_eq!(piece, back);
    }

    #[test]
    fn test_has_moved_defaults_false() {
        let piece: Piece = serde_json::from_str(r#"{"role":"king","color":"white"}"#).unwrap();
        assert!(!piece.has_moved);
    }
}
