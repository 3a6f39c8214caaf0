//! Textual move records.
//!
//! The format is `{glyph}{file}{rank}` with a `#` suffix on checkmate and
//! `+` on check; castling is written `O-O`/`O-O-O` by destination column,
//! and promotion appends `=` plus the new role's glyph.

use crate::core::{Piece, Position, Role};

fn suffix(is_check: bool, is_checkmate: bool) -> &'static str {
    if is_checkmate {
        "#"
    } else if is_check {
        "+"
    } else {
        ""
    }
}

/// `{glyph}{file}{rank}` plus the check/checkmate suffix.
#[must_use]
pub fn square_notation(piece: Piece, to: Position, is_check: bool, is_checkmate: bool) -> String {
    format!(
        "{}{}{}{}",
        piece.glyph(),
        to.file_char(),
        to.rank_char(),
        suffix(is_check, is_checkmate)
    )
}

/// Notation for a ply, with the castling override for two-column king
/// moves.
#[must_use]
pub fn move_notation(
    piece: Piece,
    from: Position,
    to: Position,
    is_check: bool,
    is_checkmate: bool,
) -> String {
    if piece.role == Role::King && (to.col - from.col).abs() == 2 {
        let base = if to.col > from.col { "O-O" } else { "O-O-O" };
        return format!("{base}{}", suffix(is_check, is_checkmate));
    }

    square_notation(piece, to, is_check, is_checkmate)
}

/// Notation for a resolved promotion: the promoted piece's square record
/// with `=<glyph>` appended.
#[must_use]
pub fn promotion_notation(
    promoted: Piece,
    position: Position,
    is_check: bool,
    is_checkmate: bool,
) -> String {
    format!(
        "{}={}",
        square_notation(promoted, position, is_check, is_checkmate),
        promoted.glyph()
    )
}
