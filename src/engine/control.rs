//! Squares controlled by one color, plus the checks and pins it creates.
//!
//! A `ControlMap` is rebuilt from scratch after every ply and never patched.
//! Pins are recorded by piece id and origin coordinates; the board stays the
//! only owner of piece data.

use crate::engine::augmented::AugmentedBoard;
use crate::engine::types::{ChessError, Color, Coords, PieceId, PieceType};

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

pub(crate) const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
pub(crate) const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Move lines of a sliding piece; empty for leapers.
pub(crate) fn slider_directions(kind: PieceType) -> &'static [(i8, i8)] {
    const QUEEN: [(i8, i8); 8] = [
        (1, 0),
        (0, 1),
        (-1, 0),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    match kind {
        PieceType::Rook => &ORTHOGONAL,
        PieceType::Bishop => &DIAGONAL,
        PieceType::Queen => &QUEEN,
        _ => &[],
    }
}

/// A piece that cannot leave the line between its king and `origin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    pub pinned: PieceId,
    pub pinned_by: PieceId,
    /// Coordinates of the pinning slider.
    pub origin: Coords,
}

/// Check the mapped color is giving the opposing king.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckState {
    None,
    Single {
        checker: PieceId,
        checker_kind: PieceType,
        checker_coords: Coords,
        king_coords: Coords,
    },
    Double,
}

#[derive(Clone, Debug)]
pub struct ControlMap {
    color: Color,
    controlled: [[bool; 8]; 8],
    check: CheckState,
    pins: Vec<Pin>,
}

impl ControlMap {
    /// Map the squares `color` controls on `board`.
    ///
    /// Panics on a third simultaneous check or a king giving check, neither
    /// of which a legal game can reach.
    pub fn build(board: &AugmentedBoard, color: Color) -> Self {
        match Self::try_build(board, color) {
            Ok(map) => map,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`ControlMap::build`], but reports impossible positions instead
    /// of panicking. Used when loading untrusted setups.
    pub fn try_build(board: &AugmentedBoard, color: Color) -> Result<Self, ChessError> {
        let mut map = ControlMap {
            color,
            controlled: [[false; 8]; 8],
            check: CheckState::None,
            pins: Vec::new(),
        };

        let mut it = board.pieces(color).iter();
        while let Some((from, id)) = it.next() {
            let Some(piece) = board.piece_at(from) else {
                return Err(ChessError::InvalidPosition(format!(
                    "piece list points at empty square {from}"
                )));
            };
            match piece.kind {
                PieceType::Pawn => {
                    for df in [-1, 1] {
                        if let Some(to) = from.offset(color.forward(), df) {
                            map.mark_leap(board, id, PieceType::Pawn, from, to)?;
                        }
                    }
                }
                PieceType::Knight => {
                    for (dr, df) in KNIGHT_OFFSETS {
                        if let Some(to) = from.offset(dr, df) {
                            map.mark_leap(board, id, PieceType::Knight, from, to)?;
                        }
                    }
                }
                PieceType::King => {
                    for (dr, df) in KING_OFFSETS {
                        if let Some(to) = from.offset(dr, df) {
                            map.mark_leap(board, id, PieceType::King, from, to)?;
                        }
                    }
                }
                kind => {
                    for &(dr, df) in slider_directions(kind) {
                        map.walk_line(board, id, kind, from, (dr, df))?;
                    }
                }
            }
        }
        Ok(map)
    }

    fn enemy_king_at(&self, board: &AugmentedBoard, c: Coords) -> bool {
        board
            .piece_at(c)
            .is_some_and(|p| p.kind == PieceType::King && p.color() != self.color)
    }

    fn mark(&mut self, c: Coords) {
        self.controlled[c.rank as usize][c.file as usize] = true;
    }

    fn mark_leap(
        &mut self,
        board: &AugmentedBoard,
        id: PieceId,
        kind: PieceType,
        from: Coords,
        to: Coords,
    ) -> Result<(), ChessError> {
        self.mark(to);
        if self.enemy_king_at(board, to) {
            self.register_check(id, kind, from, to)?;
        }
        Ok(())
    }

    fn walk_line(
        &mut self,
        board: &AugmentedBoard,
        id: PieceId,
        kind: PieceType,
        from: Coords,
        (dr, df): (i8, i8),
    ) -> Result<(), ChessError> {
        let mut candidate: Option<PieceId> = None;
        let mut cur = from;
        while let Some(next) = cur.offset(dr, df) {
            cur = next;
            let occupant = board.piece_at(cur);
            match (candidate, occupant) {
                (None, None) => self.mark(cur),
                (None, Some(p)) => {
                    self.mark(cur);
                    if p.color() == self.color {
                        return Ok(());
                    }
                    if p.kind != PieceType::King {
                        candidate = Some(p.id);
                        continue;
                    }
                    self.register_check(id, kind, from, cur)?;
                    // The king cannot step back along the line of check.
                    if let Some(behind) = cur.offset(dr, df) {
                        self.mark(behind);
                    }
                    return Ok(());
                }
                (Some(_), None) => {}
                (Some(pinned), Some(p)) => {
                    if p.kind == PieceType::King && p.color() != self.color {
                        self.pins.push(Pin {
                            pinned,
                            pinned_by: id,
                            origin: from,
                        });
                    }
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn register_check(
        &mut self,
        checker: PieceId,
        checker_kind: PieceType,
        checker_coords: Coords,
        king_coords: Coords,
    ) -> Result<(), ChessError> {
        if checker_kind == PieceType::King {
            return Err(ChessError::InvalidPosition(format!(
                "king at {checker_coords} attacks the opposing king at {king_coords}"
            )));
        }
        self.check = match self.check {
            CheckState::None => CheckState::Single {
                checker,
                checker_kind,
                checker_coords,
                king_coords,
            },
            CheckState::Single { .. } => CheckState::Double,
            CheckState::Double => {
                return Err(ChessError::InvalidPosition(format!(
                    "third simultaneous check on king at {king_coords}"
                )));
            }
        };
        Ok(())
    }

    // -- queries --------------------------------------------------------

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn square_is_controlled(&self, c: Coords) -> bool {
        self.controlled[c.rank as usize][c.file as usize]
    }

    #[inline]
    pub fn check_state(&self) -> CheckState {
        self.check
    }

    /// Whether the opposing king is in check at all.
    #[inline]
    pub fn gives_check(&self) -> bool {
        self.check != CheckState::None
    }

    #[inline]
    pub fn has_king_in_single_check(&self) -> bool {
        matches!(self.check, CheckState::Single { .. })
    }

    #[inline]
    pub fn has_king_in_double_check(&self) -> bool {
        self.check == CheckState::Double
    }

    fn single_check(&self) -> (PieceId, PieceType, Coords, Coords) {
        match self.check {
            CheckState::Single {
                checker,
                checker_kind,
                checker_coords,
                king_coords,
            } => (checker, checker_kind, checker_coords, king_coords),
            other => panic!("check detail queried outside single check: {other:?}"),
        }
    }

    /// Panics unless in single check.
    pub fn checker(&self) -> PieceId {
        self.single_check().0
    }

    /// Panics unless in single check.
    pub fn checker_kind(&self) -> PieceType {
        self.single_check().1
    }

    /// Panics unless in single check.
    pub fn checker_coords(&self) -> Coords {
        self.single_check().2
    }

    /// Panics unless in single check.
    pub fn king_in_check_coords(&self) -> Coords {
        self.single_check().3
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn pin_for(&self, id: PieceId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.pinned == id)
    }
}
