//! Chess piece value object.

use crate::engine::types::{Color, PieceId, PieceType};

/// A piece on the board.
///
/// The id is assigned once and survives promotion; the type is the only
/// field that promotion rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceType,
    /// Number of times this piece has moved.
    pub move_count: u32,
    /// Set for the single opposing ply after a pawn double step.
    pub en_passant: bool,
}

impl Piece {
    pub fn new(id: PieceId, kind: PieceType) -> Self {
        Piece {
            id,
            kind,
            move_count: 0,
            en_passant: false,
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.id.color()
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.move_count > 0
    }

    /// Reset per-ply flags. Called on every piece at the start of a ply.
    #[inline]
    pub fn clear_transient(&mut self) {
        self.en_passant = false;
    }
}
