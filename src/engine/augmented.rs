//! Board plus per-color piece lists behind a single mutation surface.

use crate::engine::board::Board;
use crate::engine::piece::Piece;
use crate::engine::piece_list::PieceList;
use crate::engine::types::{Color, Coords, PieceId, PieceType};

/// Back-rank order from the a-file to the h-file.
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// Invariant: after every mutator returns, `board` and both piece lists
/// describe exactly the same occupancy.
#[derive(Clone, Debug)]
pub struct AugmentedBoard {
    board: Board,
    lists: [PieceList; 2],
    test_mode: bool,
}

impl AugmentedBoard {
    pub fn empty(test_mode: bool) -> Self {
        AugmentedBoard {
            board: Board::empty(),
            lists: [PieceList::new(), PieceList::new()],
            test_mode,
        }
    }

    /// Standard starting position. Per color, pawns take the first eight ids
    /// (a to h) and the back rank the next eight.
    pub fn standard() -> Self {
        let mut ab = AugmentedBoard::empty(false);
        for color in [Color::White, Color::Black] {
            let base = PieceId::first_of(color);
            let home = color.home_rank();
            let pawn_rank = (home as i8 + color.forward()) as u8;
            for file in 0..8u8 {
                ab.add_piece(
                    Coords::new(pawn_rank, file),
                    Piece::new(PieceId(base + file), PieceType::Pawn),
                );
                ab.add_piece(
                    Coords::new(home, file),
                    Piece::new(PieceId(base + 8 + file), BACK_RANK[file as usize]),
                );
            }
        }
        ab
    }

    /// Switch test mode, which permits removing kings.
    pub fn set_test_mode(&mut self, on: bool) {
        self.test_mode = on;
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn pieces(&self, color: Color) -> &PieceList {
        &self.lists[color.index()]
    }

    #[inline]
    pub fn piece_at(&self, c: Coords) -> Option<&Piece> {
        self.board.piece_at(c)
    }

    /// Coordinates of `color`'s king, if it is on the board.
    pub fn king_coords(&self, color: Color) -> Option<Coords> {
        self.pieces(color)
            .iter()
            .map(|(c, _)| c)
            .find(|&c| self.board.piece_at(c).is_some_and(|p| p.kind == PieceType::King))
    }

    /// Put a new piece on an empty square (setup only).
    pub fn add_piece(&mut self, c: Coords, piece: Piece) {
        let color = piece.color();
        self.board.place_piece(c, piece);
        self.lists[color.index()].insert(c, piece.id);
    }

    pub fn move_piece(&mut self, from: Coords, to: Coords) {
        let Some(color) = self.board.color_at(from) else {
            panic!("cannot move from empty square {from}");
        };
        self.board.move_piece(from, to);
        self.lists[color.index()].relocate(from, to);
    }

    /// Remove a captured piece. Kings may only be removed in test mode.
    pub fn remove_piece(&mut self, c: Coords) -> Piece {
        let Some(occupant) = self.board.piece_at(c) else {
            panic!("cannot remove piece from empty square {c}");
        };
        assert!(
            self.test_mode || occupant.kind != PieceType::King,
            "cannot remove king at {c}"
        );
        let piece = self.board.remove_piece(c);
        self.lists[piece.color().index()].remove(c);
        piece
    }

    pub fn promote_piece(&mut self, c: Coords, kind: PieceType) {
        self.board.promote_piece(c, kind);
    }

    /// Set the en-passant flag on the pawn at `c`.
    pub fn mark_en_passant(&mut self, c: Coords) {
        match self.board.piece_at_mut(c) {
            Some(p) if p.kind == PieceType::Pawn => p.en_passant = true,
            _ => panic!("no pawn at {c} to mark en passant"),
        }
    }

    /// Clear per-ply flags on every piece of both colors.
    pub fn clear_transient_flags(&mut self) {
        for color in [Color::White, Color::Black] {
            let mut it = self.lists[color.index()].iter();
            while let Some((c, _)) = it.next() {
                if let Some(p) = self.board.piece_at_mut(c) {
                    p.clear_transient();
                }
            }
        }
    }

    /// `(coords, type)` of every piece of `color`, in list order.
    pub fn material(&self, color: Color) -> Vec<(Coords, PieceType)> {
        self.pieces(color)
            .iter()
            .filter_map(|(c, _)| self.board.piece_at(c).map(|p| (c, p.kind)))
            .collect()
    }

    /// Panics if the board and piece lists disagree anywhere.
    pub fn assert_consistent(&self) {
        let mut seen = 0;
        for rank in 0..8 {
            for file in 0..8 {
                let c = Coords::new(rank, file);
                match self.board.piece_at(c) {
                    Some(p) => {
                        seen += 1;
                        let list = self.pieces(p.color());
                        assert!(list.contains(c), "piece {} at {c} missing from list", p.id);
                        assert_eq!(list.coords_of(p.id), Some(c), "list misplaces {}", p.id);
                        assert!(!self.pieces(!p.color()).contains(c), "{c} listed twice");
                    }
                    None => {
                        assert!(!self.lists[0].contains(c), "{c} is empty but listed");
                        assert!(!self.lists[1].contains(c), "{c} is empty but listed");
                    }
                }
            }
        }
        assert_eq!(seen, self.lists[0].len() + self.lists[1].len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_ids() {
        let ab = AugmentedBoard::standard();
        ab.assert_consistent();
        assert_eq!(ab.pieces(Color::White).len(), 16);
        assert_eq!(ab.pieces(Color::Black).len(), 16);

        let wk = ab.piece_at(Coords::new(0, 4)).unwrap();
        assert_eq!((wk.id, wk.kind), (PieceId(12), PieceType::King));
        let bp = ab.piece_at(Coords::new(6, 0)).unwrap();
        assert_eq!((bp.id, bp.kind), (PieceId(16), PieceType::Pawn));
        let br = ab.piece_at(Coords::new(7, 7)).unwrap();
        assert_eq!((br.id, br.kind), (PieceId(31), PieceType::Rook));
        assert_eq!(ab.king_coords(Color::Black), Some(Coords::new(7, 4)));
    }

    #[test]
    fn mutators_keep_lists_in_sync() {
        let mut ab = AugmentedBoard::standard();
        ab.move_piece(Coords::new(1, 4), Coords::new(3, 4));
        ab.move_piece(Coords::new(6, 3), Coords::new(4, 3));
        let captured = ab.remove_piece(Coords::new(4, 3));
        assert_eq!(captured.id, PieceId(19));
        ab.move_piece(Coords::new(3, 4), Coords::new(4, 3));
        ab.assert_consistent();
        assert_eq!(ab.pieces(Color::Black).len(), 15);
        assert_eq!(ab.piece_at(Coords::new(4, 3)).unwrap().move_count, 2);
    }

    #[test]
    #[should_panic(expected = "cannot remove king")]
    fn king_removal_panics_outside_test_mode() {
        let mut ab = AugmentedBoard::standard();
        ab.remove_piece(Coords::new(0, 4));
    }

    #[test]
    fn king_removal_allowed_in_test_mode() {
        let mut ab = AugmentedBoard::empty(true);
        ab.add_piece(Coords::new(0, 4), Piece::new(PieceId(12), PieceType::King));
        ab.remove_piece(Coords::new(0, 4));
        ab.assert_consistent();
        assert!(ab.pieces(Color::White).is_empty());
    }

    #[test]
    fn clear_transient_flags_on_all_pieces() {
        let mut ab = AugmentedBoard::standard();
        ab.move_piece(Coords::new(1, 0), Coords::new(3, 0));
        ab.mark_en_passant(Coords::new(3, 0));
        assert!(ab.piece_at(Coords::new(3, 0)).unwrap().en_passant);
        ab.clear_transient_flags();
        assert!(!ab.piece_at(Coords::new(3, 0)).unwrap().en_passant);
    }
}
