//! Legal move generation for the side to move.
//!
//! Built from the opponent's freshly computed [`ControlMap`], so check
//! evasion and pin restrictions are applied as set filters over each piece's
//! natural movement rather than by trying moves and undoing them.

use std::collections::BTreeMap;

use crate::engine::augmented::AugmentedBoard;
use crate::engine::control::{
    slider_directions, CheckState, ControlMap, KING_OFFSETS, KNIGHT_OFFSETS,
};
use crate::engine::types::{CastlingRights, Color, Coords, PieceType};

#[derive(Clone, Debug)]
pub struct MoveGenerator {
    color: Color,
    moves: BTreeMap<Coords, Vec<Coords>>,
    /// En-passant captures `(from, to)` that survived every filter.
    en_passant: Vec<(Coords, Coords)>,
}

/// Squares a non-king move must land on to resolve a single check.
struct CheckRemoval {
    squares: Vec<Coords>,
    /// En-passant target that captures a checking pawn, if any.
    en_passant_target: Option<Coords>,
}

impl MoveGenerator {
    /// Generate every legal move for `color`. `opponent` must be the
    /// control map of the other color on the same board.
    pub fn new(
        board: &AugmentedBoard,
        color: Color,
        opponent: &ControlMap,
        castling: CastlingRights,
    ) -> Self {
        debug_assert_eq!(opponent.color(), !color);

        let king = board.king_coords(color);
        let removal = Self::check_removal(board, color, opponent);
        let mut mg = MoveGenerator {
            color,
            moves: BTreeMap::new(),
            en_passant: Vec::new(),
        };

        let mut it = board.pieces(color).iter();
        while let Some((from, id)) = it.next() {
            let Some(piece) = board.piece_at(from) else {
                panic!("piece list points at empty square {from}");
            };

            if piece.kind == PieceType::King {
                let dests = mg.king_moves(board, from, opponent, castling);
                mg.moves.insert(from, dests);
                continue;
            }
            if opponent.has_king_in_double_check() {
                mg.moves.insert(from, Vec::new());
                continue;
            }

            let (mut dests, ep_target) = match piece.kind {
                PieceType::Pawn => mg.pawn_moves(board, from, king),
                PieceType::Knight => (mg.leaps(board, from, &KNIGHT_OFFSETS), None),
                kind => (mg.slides(board, from, slider_directions(kind)), None),
            };

            if let (Some(pin), Some(king)) = (opponent.pin_for(id), king) {
                let line = king.direction_to(pin.origin);
                dests.retain(|&to| king.direction_to(to) == line);
            }

            // Only the en-passant capture itself removes a checking pawn from
            // its target square; any other piece landing there leaves the check.
            if let Some(removal) = &removal {
                dests.retain(|&to| {
                    removal.squares.contains(&to)
                        || (ep_target == Some(to) && removal.en_passant_target == Some(to))
                });
            }

            if let Some(to) = ep_target
                && dests.contains(&to)
            {
                mg.en_passant.push((from, to));
            }
            mg.moves.insert(from, dests);
        }
        mg
    }

    fn check_removal(
        board: &AugmentedBoard,
        color: Color,
        opponent: &ControlMap,
    ) -> Option<CheckRemoval> {
        let CheckState::Single {
            checker_kind,
            checker_coords,
            king_coords,
            ..
        } = opponent.check_state()
        else {
            return None;
        };

        let mut squares = vec![checker_coords];
        if checker_kind.is_slider()
            && let Some((dr, df)) = checker_coords.direction_to(king_coords)
        {
            let mut cur = checker_coords;
            while let Some(next) = cur.offset(dr, df) {
                if next == king_coords {
                    break;
                }
                squares.push(next);
                cur = next;
            }
        }

        let en_passant_target = board
            .piece_at(checker_coords)
            .filter(|p| p.kind == PieceType::Pawn && p.en_passant)
            .and_then(|_| checker_coords.offset(color.forward(), 0));

        Some(CheckRemoval {
            squares,
            en_passant_target,
        })
    }

    fn king_moves(
        &self,
        board: &AugmentedBoard,
        from: Coords,
        opponent: &ControlMap,
        castling: CastlingRights,
    ) -> Vec<Coords> {
        let mut dests: Vec<Coords> = KING_OFFSETS
            .iter()
            .filter_map(|&(dr, df)| from.offset(dr, df))
            .filter(|&to| board.board().color_at(to) != Some(self.color))
            .filter(|&to| !opponent.square_is_controlled(to))
            .collect();

        let home = self.color.home_rank();
        if from != Coords::new(home, 4) || opponent.gives_check() {
            return dests;
        }
        let rook_at = |file: u8| {
            board.piece_at(Coords::new(home, file)).is_some_and(|p| {
                p.kind == PieceType::Rook && p.color() == self.color
            })
        };
        let empty = |file: u8| board.board().is_empty(Coords::new(home, file));
        let safe = |file: u8| !opponent.square_is_controlled(Coords::new(home, file));

        if castling.kingside(self.color)
            && rook_at(7)
            && empty(5)
            && empty(6)
            && safe(5)
            && safe(6)
        {
            dests.push(Coords::new(home, 6));
        }
        if castling.queenside(self.color)
            && rook_at(0)
            && empty(1)
            && empty(2)
            && empty(3)
            && safe(2)
            && safe(3)
        {
            dests.push(Coords::new(home, 2));
        }
        dests
    }

    fn leaps(&self, board: &AugmentedBoard, from: Coords, offsets: &[(i8, i8)]) -> Vec<Coords> {
        offsets
            .iter()
            .filter_map(|&(dr, df)| from.offset(dr, df))
            .filter(|&to| board.board().color_at(to) != Some(self.color))
            .collect()
    }

    fn slides(&self, board: &AugmentedBoard, from: Coords, dirs: &[(i8, i8)]) -> Vec<Coords> {
        let mut dests = Vec::new();
        for &(dr, df) in dirs {
            let mut cur = from;
            while let Some(next) = cur.offset(dr, df) {
                cur = next;
                match board.board().color_at(cur) {
                    None => dests.push(cur),
                    Some(c) => {
                        if c != self.color {
                            dests.push(cur);
                        }
                        break;
                    }
                }
            }
        }
        dests
    }

    /// Pawn pushes and captures, plus the en-passant destination if one is
    /// available.
    fn pawn_moves(
        &self,
        board: &AugmentedBoard,
        from: Coords,
        king: Option<Coords>,
    ) -> (Vec<Coords>, Option<Coords>) {
        let b = board.board();
        let fwd = self.color.forward();
        let mut dests = Vec::new();
        let mut ep_target = None;

        if let Some(one) = from.offset(fwd, 0)
            && b.is_empty(one)
        {
            dests.push(one);
            let unmoved = b.piece_at(from).is_some_and(|p| !p.has_moved());
            if unmoved
                && let Some(two) = one.offset(fwd, 0)
                && b.is_empty(two)
            {
                dests.push(two);
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(fwd, df) else {
                continue;
            };
            if b.color_at(to) == Some(!self.color) {
                dests.push(to);
                continue;
            }
            let Some(beside) = from.offset(0, df) else {
                continue;
            };
            let eligible = b.piece_at(beside).is_some_and(|p| {
                p.kind == PieceType::Pawn && p.en_passant && p.color() != self.color
            });
            if eligible
                && b.is_empty(to)
                && !self.en_passant_exposes_king(board, from, beside, king)
            {
                dests.push(to);
                ep_target = Some(to);
            }
        }
        (dests, ep_target)
    }

    /// Whether removing both pawns from their rank would open a rook or queen
    /// line onto the mover's king.
    fn en_passant_exposes_king(
        &self,
        board: &AugmentedBoard,
        from: Coords,
        captured: Coords,
        king: Option<Coords>,
    ) -> bool {
        let Some(king) = king else {
            return false;
        };
        if king.rank != from.rank {
            return false;
        }
        let step = if from.file > king.file { 1 } else { -1 };
        let mut cur = king;
        while let Some(next) = cur.offset(0, step) {
            cur = next;
            if cur == from || cur == captured {
                continue;
            }
            if let Some(p) = board.piece_at(cur) {
                return p.color() != self.color
                    && matches!(p.kind, PieceType::Rook | PieceType::Queen);
            }
        }
        false
    }

    // -- queries --------------------------------------------------------

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Legal destinations of the piece at `from`, if it belongs to the side
    /// to move.
    pub fn destinations(&self, from: Coords) -> Option<&[Coords]> {
        self.moves.get(&from).map(Vec::as_slice)
    }

    /// Panics if `from` holds no piece of the side to move.
    pub fn is_valid_move(&self, from: Coords, to: Coords) -> bool {
        match self.moves.get(&from) {
            Some(dests) => dests.contains(&to),
            None => panic!("no move generator entry for {from}"),
        }
    }

    pub fn has_valid_moves(&self) -> bool {
        self.moves.values().any(|d| !d.is_empty())
    }

    /// Whether any legal en-passant capture exists right now.
    pub fn en_passant_available(&self) -> bool {
        !self.en_passant.is_empty()
    }

    pub fn is_en_passant(&self, from: Coords, to: Coords) -> bool {
        self.en_passant.contains(&(from, to))
    }

    /// Every `(from, destinations)` entry, in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Coords, &[Coords])> {
        self.moves.iter().map(|(c, d)| (*c, d.as_slice()))
    }

    pub fn move_count(&self) -> usize {
        self.moves.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::piece::Piece;
    use crate::engine::types::PieceId;

    fn board_with(pieces: &[(u8, u8, u8, PieceType)]) -> AugmentedBoard {
        let mut ab = AugmentedBoard::empty(true);
        for &(rank, file, id, kind) in pieces {
            let mut p = Piece::new(PieceId(id), kind);
            if kind == PieceType::Pawn && rank != 1 && rank != 6 {
                p.move_count = 1;
            }
            ab.add_piece(Coords::new(rank, file), p);
        }
        ab
    }

    fn generate(ab: &AugmentedBoard, color: Color, castling: CastlingRights) -> MoveGenerator {
        let opp = ControlMap::build(ab, !color);
        MoveGenerator::new(ab, color, &opp, castling)
    }

    fn sorted(v: &[Coords]) -> Vec<Coords> {
        let mut v = v.to_vec();
        v.sort();
        v
    }

    #[test]
    fn twenty_moves_from_start() {
        let ab = AugmentedBoard::standard();
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        assert_eq!(mg.move_count(), 20);
        assert!(mg.is_valid_move(Coords::new(1, 4), Coords::new(3, 4)));
        assert!(!mg.is_valid_move(Coords::new(0, 0), Coords::new(1, 0)));
        assert_eq!(mg.iter().count(), 16);
    }

    #[test]
    #[should_panic(expected = "no move generator entry")]
    fn is_valid_move_on_foreign_square_panics() {
        let ab = AugmentedBoard::standard();
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        mg.is_valid_move(Coords::new(6, 4), Coords::new(5, 4));
    }

    #[test]
    fn double_check_leaves_only_king_moves() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 0, 8, PieceType::Rook),
            (5, 1, 9, PieceType::Knight),
            (7, 0, 28, PieceType::King),
            (7, 7, 24, PieceType::Rook),
            (6, 3, 27, PieceType::Queen),
        ]);
        let mg = generate(&ab, Color::Black, CastlingRights::NONE);
        assert_eq!(mg.destinations(Coords::new(7, 7)), Some(&[][..]));
        assert_eq!(mg.destinations(Coords::new(6, 3)), Some(&[][..]));
        assert_eq!(
            sorted(mg.destinations(Coords::new(7, 0)).unwrap()),
            vec![Coords::new(6, 1), Coords::new(7, 1)]
        );
    }

    #[test]
    fn single_check_block_or_capture() {
        // Rook on a1 checks the king on a8; the black rook can block on the
        // a-file or the queen can capture.
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 0, 8, PieceType::Rook),
            (7, 0, 28, PieceType::King),
            (4, 7, 24, PieceType::Rook),
            (3, 3, 27, PieceType::Queen),
        ]);
        let mg = generate(&ab, Color::Black, CastlingRights::NONE);
        assert_eq!(mg.destinations(Coords::new(4, 7)), Some(&[Coords::new(4, 0)][..]));
        assert_eq!(
            sorted(mg.destinations(Coords::new(3, 3)).unwrap()),
            vec![Coords::new(0, 0), Coords::new(3, 0), Coords::new(6, 0)]
        );
        assert!(!mg.is_valid_move(Coords::new(7, 0), Coords::new(6, 0)));
        assert!(mg.is_valid_move(Coords::new(7, 0), Coords::new(7, 1)));
    }

    #[test]
    fn knight_check_must_be_captured() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (2, 3, 25, PieceType::Knight),
            (0, 1, 10, PieceType::Bishop),
            (7, 0, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        assert_eq!(mg.destinations(Coords::new(0, 1)), Some(&[Coords::new(2, 3)][..]));
    }

    #[test]
    fn pinned_pieces_stay_on_the_line() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (2, 4, 15, PieceType::Rook),
            (3, 3, 14, PieceType::Knight),
            (1, 5, 13, PieceType::Bishop),
            (6, 4, 24, PieceType::Rook),
            (4, 1, 26, PieceType::Queen),
            (3, 7, 25, PieceType::Bishop),
            (7, 7, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        // Rook pinned on the e-file keeps its file moves, including the capture.
        assert_eq!(
            sorted(mg.destinations(Coords::new(2, 4)).unwrap()),
            vec![
                Coords::new(1, 4),
                Coords::new(3, 4),
                Coords::new(4, 4),
                Coords::new(5, 4),
                Coords::new(6, 4),
            ]
        );
        // Bishop pinned by the h4 bishop slides only along that diagonal.
        assert_eq!(
            sorted(mg.destinations(Coords::new(1, 5)).unwrap()),
            vec![Coords::new(2, 6), Coords::new(3, 7)]
        );
        // Knight on d4 is not pinned (queen on b5 is not aligned with it).
        assert!(!mg.destinations(Coords::new(3, 3)).unwrap().is_empty());
    }

    #[test]
    fn pinned_knight_cannot_move() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (1, 4, 14, PieceType::Knight),
            (5, 4, 24, PieceType::Rook),
            (7, 7, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        assert!(mg.destinations(Coords::new(1, 4)).unwrap().is_empty());
    }

    #[test]
    fn castling_both_sides() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 0, 8, PieceType::Rook),
            (0, 7, 15, PieceType::Rook),
            (7, 4, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        assert!(mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 6)));
        assert!(mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 2)));

        let mg = generate(
            &ab,
            Color::White,
            CastlingRights {
                white_kingside: false,
                ..CastlingRights::ALL
            },
        );
        assert!(!mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 6)));
    }

    #[test]
    fn castling_blocked_through_controlled_square() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 0, 8, PieceType::Rook),
            (0, 7, 15, PieceType::Rook),
            (5, 5, 24, PieceType::Rook),
            (7, 4, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        assert!(!mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 6)));
        assert!(mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 2)));
    }

    #[test]
    fn queenside_castling_ignores_attacked_b_file() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 0, 8, PieceType::Rook),
            (5, 1, 24, PieceType::Rook),
            (7, 4, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        assert!(mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 2)));
    }

    #[test]
    fn no_castling_out_of_check() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (0, 7, 15, PieceType::Rook),
            (5, 4, 24, PieceType::Rook),
            (7, 0, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::ALL);
        assert!(!mg.is_valid_move(Coords::new(0, 4), Coords::new(0, 6)));
    }

    #[test]
    fn pawn_pushes_and_captures() {
        let ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (1, 3, 3, PieceType::Pawn),
            (2, 4, 20, PieceType::Pawn),
            (3, 3, 21, PieceType::Pawn),
            (7, 4, 28, PieceType::King),
        ]);
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        // d2 pawn: d3 only (d4 blocked), plus capture on e3.
        assert_eq!(
            sorted(mg.destinations(Coords::new(1, 3)).unwrap()),
            vec![Coords::new(2, 3), Coords::new(2, 4)]
        );
    }

    #[test]
    fn en_passant_capture() {
        let mut ab = board_with(&[
            (0, 4, 12, PieceType::King),
            (4, 4, 4, PieceType::Pawn),
            (4, 3, 19, PieceType::Pawn),
            (7, 4, 28, PieceType::King),
        ]);
        ab.mark_en_passant(Coords::new(4, 3));
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        assert!(mg.is_valid_move(Coords::new(4, 4), Coords::new(5, 3)));
        assert!(mg.en_passant_available());
        assert!(mg.is_en_passant(Coords::new(4, 4), Coords::new(5, 3)));
    }

    #[test]
    fn en_passant_excluded_when_it_exposes_king_on_rank() {
        let mut ab = board_with(&[
            (4, 0, 12, PieceType::King),
            (4, 4, 4, PieceType::Pawn),
            (4, 5, 21, PieceType::Pawn),
            (4, 7, 24, PieceType::Rook),
            (7, 4, 28, PieceType::King),
        ]);
        ab.mark_en_passant(Coords::new(4, 5));
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        assert!(!mg.is_valid_move(Coords::new(4, 4), Coords::new(5, 5)));
        assert!(!mg.en_passant_available());
    }

    #[test]
    fn en_passant_captures_checking_pawn() {
        // Black pawn d7-d5 gives check to the king on e4.
        let mut ab = board_with(&[
            (3, 4, 12, PieceType::King),
            (4, 4, 4, PieceType::Pawn),
            (4, 3, 19, PieceType::Pawn),
            (7, 7, 28, PieceType::King),
        ]);
        ab.mark_en_passant(Coords::new(4, 3));
        let mg = generate(&ab, Color::White, CastlingRights::NONE);
        assert!(mg.is_valid_move(Coords::new(4, 4), Coords::new(5, 3)));
        // The pawn's ordinary push does not resolve the check.
        assert!(!mg.is_valid_move(Coords::new(4, 4), Coords::new(5, 4)));
    }

    #[test]
    fn only_the_pawn_may_use_en_passant_square_against_check() {
        // Black pawn d7-d5 checks the king on e4; the knight on b5 reaches d6.
        let mut ab = board_with(&[
            (3, 4, 12, PieceType::King),
            (4, 1, 9, PieceType::Knight),
            (4, 4, 4, PieceType::Pawn),
            (4, 3, 19, PieceType::Pawn),
            (7, 7, 28, PieceType::King),
        ]);
        ab.mark_en_passant(Coords::new(4, 3));
        let mg = generate(&ab, Color::White, CastlingRights::NONE);

        assert!(mg.is_valid_move(Coords::new(4, 4), Coords::new(5, 3)));
        assert!(!mg.is_valid_move(Coords::new(4, 1), Coords::new(5, 3)));
        // The knight cannot reach d5, so it has no way to help.
        assert_eq!(mg.destinations(Coords::new(4, 1)), Some(&[][..]));
    }

    #[test]
    fn has_valid_moves_false_at_stalemate() {
        let ab = board_with(&[
            (7, 0, 28, PieceType::King),
            (5, 1, 11, PieceType::Queen),
            (5, 2, 12, PieceType::King),
        ]);
        let mg = generate(&ab, Color::Black, CastlingRights::NONE);
        assert!(!mg.has_valid_moves());
    }
}
