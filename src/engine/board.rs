//! Mailbox 8×8 board.
//!
//! `Board` owns every `Square` and therefore every `Piece`. Its primitives
//! validate their preconditions and panic on violation: the game layer only
//! ever calls them with moves it has already generated, so a failure here is
//! a bug in the caller.

use crate::engine::piece::Piece;
use crate::engine::types::{Color, Coords, PieceType};

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// One cell of the board, holding at most one piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Square {
    piece: Option<Piece>,
}

impl Square {
    #[inline]
    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.piece.is_none()
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    squares: [[Square; 8]; 8],
}

impl Board {
    pub fn empty() -> Self {
        Board::default()
    }

    #[inline]
    pub fn square(&self, c: Coords) -> &Square {
        &self.squares[c.rank as usize][c.file as usize]
    }

    #[inline]
    pub fn piece_at(&self, c: Coords) -> Option<&Piece> {
        self.square(c).piece()
    }

    #[inline]
    pub fn piece_at_mut(&mut self, c: Coords) -> Option<&mut Piece> {
        self.squares[c.rank as usize][c.file as usize].piece.as_mut()
    }

    #[inline]
    pub fn is_empty(&self, c: Coords) -> bool {
        self.square(c).is_empty()
    }

    /// Color of the occupant at `c`, if any.
    #[inline]
    pub fn color_at(&self, c: Coords) -> Option<Color> {
        self.piece_at(c).map(Piece::color)
    }

    /// Place `piece` on an empty square.
    pub fn place_piece(&mut self, c: Coords, piece: Piece) {
        let sq = &mut self.squares[c.rank as usize][c.file as usize];
        assert!(sq.piece.is_none(), "cannot place piece on occupied square {c}");
        sq.piece = Some(piece);
    }

    /// Remove and return the occupant of `c`.
    pub fn remove_piece(&mut self, c: Coords) -> Piece {
        match self.squares[c.rank as usize][c.file as usize].piece.take() {
            Some(p) => p,
            None => panic!("cannot remove piece from empty square {c}"),
        }
    }

    /// Relocate the occupant of `from` onto the empty square `to` and bump
    /// its move counter.
    pub fn move_piece(&mut self, from: Coords, to: Coords) {
        assert!(!self.is_empty(from), "cannot move from empty square {from}");
        assert!(self.is_empty(to), "cannot move onto occupied square {to}");
        let mut piece = self.remove_piece(from);
        piece.move_count += 1;
        self.place_piece(to, piece);
    }

    /// Rewrite the type of a pawn standing on its back rank.
    pub fn promote_piece(&mut self, c: Coords, kind: PieceType) {
        assert!(
            kind.is_promotion_target(),
            "cannot promote to {kind} at {c}"
        );
        let Some(piece) = self.piece_at_mut(c) else {
            panic!("cannot promote on empty square {c}");
        };
        assert!(
            piece.kind == PieceType::Pawn,
            "cannot promote a {} at {c}",
            piece.kind
        );
        assert!(
            c.rank == piece.color().back_rank(),
            "pawn at {c} is not on its back rank"
        );
        piece.kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::PieceId;

    fn pawn(id: u8) -> Piece {
        Piece::new(PieceId(id), PieceType::Pawn)
    }

    #[test]
    fn place_and_move() {
        let mut b = Board::empty();
        b.place_piece(Coords::new(1, 4), pawn(4));
        b.move_piece(Coords::new(1, 4), Coords::new(3, 4));
        assert!(b.is_empty(Coords::new(1, 4)));
        let p = b.piece_at(Coords::new(3, 4)).unwrap();
        assert_eq!(p.id, PieceId(4));
        assert_eq!(p.move_count, 1);
    }

    #[test]
    #[should_panic(expected = "empty square")]
    fn move_from_empty_panics() {
        let mut b = Board::empty();
        b.move_piece(Coords::new(0, 0), Coords::new(1, 0));
    }

    #[test]
    #[should_panic(expected = "occupied square")]
    fn move_onto_occupied_panics() {
        let mut b = Board::empty();
        b.place_piece(Coords::new(0, 0), pawn(0));
        b.place_piece(Coords::new(1, 0), pawn(1));
        b.move_piece(Coords::new(0, 0), Coords::new(1, 0));
    }

    #[test]
    #[should_panic(expected = "empty square")]
    fn remove_from_empty_panics() {
        let mut b = Board::empty();
        b.remove_piece(Coords::new(4, 4));
    }

    #[test]
    fn promotion_keeps_id() {
        let mut b = Board::empty();
        b.place_piece(Coords::new(7, 2), pawn(2));
        b.promote_piece(Coords::new(7, 2), PieceType::Knight);
        let p = b.piece_at(Coords::new(7, 2)).unwrap();
        assert_eq!(p.id, PieceId(2));
        assert_eq!(p.kind, PieceType::Knight);
    }

    #[test]
    #[should_panic(expected = "back rank")]
    fn promotion_off_back_rank_panics() {
        let mut b = Board::empty();
        b.place_piece(Coords::new(6, 2), pawn(2));
        b.promote_piece(Coords::new(6, 2), PieceType::Queen);
    }

    #[test]
    #[should_panic(expected = "cannot promote to king")]
    fn promotion_to_king_panics() {
        let mut b = Board::empty();
        b.place_piece(Coords::new(7, 2), pawn(2));
        b.promote_piece(Coords::new(7, 2), PieceType::King);
    }
}
