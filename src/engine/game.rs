//! Stateful game controller.
//!
//! `ChessGame` sequences turns, validates and applies moves, and runs the
//! termination state machine (checkmate, stalemate, the draw rules, and the
//! administrative endings). After every accepted ply it rebuilds the mover's
//! [`ControlMap`] and the opponent's [`MoveGenerator`] from scratch.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::augmented::AugmentedBoard;
use crate::engine::control::ControlMap;
use crate::engine::fen;
use crate::engine::movegen::MoveGenerator;
use crate::engine::piece::Piece;
use crate::engine::types::{
    CastlingRights, ChessError, Color, Coords, GameStatus, PieceId, PieceType,
};

/// Half-moves without a capture or pawn move that end the game.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

// =========================================================================
// MoveRecord
// =========================================================================

/// A move accepted by [`ChessGame::play_move`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub piece: PieceId,
    pub piece_type: PieceType,
    pub from: Coords,
    pub to: Coords,
    pub captured: Option<PieceId>,
    pub promotion: Option<PieceType>,
    pub castling: bool,
    pub en_passant: bool,
}

// =========================================================================
// Snapshot representation
// =========================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceInfo {
    pub coords: Coords,
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    /// Legal destinations; only present for the side to move.
    pub possible_moves: Option<Vec<Coords>>,
}

/// Player-facing copy of the game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRepresentation {
    pub game_status: GameStatus,
    pub player_to_move_color: Color,
    pub player_to_move_is_in_check: bool,
    pub white_piece_info: BTreeMap<PieceId, PieceInfo>,
    pub black_piece_info: BTreeMap<PieceId, PieceInfo>,
}

// =========================================================================
// Repetition tracking
// =========================================================================

/// One position seen with a given side to move, and how often.
#[derive(Clone, Debug)]
struct PositionRecord {
    snapshot: Vec<(Coords, Color, PieceType)>,
    count: u8,
}

/// What one side has left besides its king, for the material draw rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Material {
    KingAlone,
    OneMinor,
    TwoKnights,
    /// Bishop pair, or bishop and knight.
    TwoMinors,
    Sufficient,
}

// =========================================================================
// ChessGame
// =========================================================================

#[derive(Clone, Debug)]
pub struct ChessGame {
    board: AugmentedBoard,
    /// Control map of the side that just moved.
    control: ControlMap,
    movegen: MoveGenerator,
    status: GameStatus,
    side_to_move: Color,
    history: Vec<MoveRecord>,
    fifty_move_counter: u32,
    repetition: [Vec<PositionRecord>; 2],
    castling: CastlingRights,
}

impl ChessGame {
    /// A game from the standard starting position.
    pub fn new() -> Self {
        Self::from_board(AugmentedBoard::standard(), Color::White, CastlingRights::ALL, 0)
    }

    /// Like [`ChessGame::new`], but kings may be captured off the board.
    pub fn new_test() -> Self {
        let mut board = AugmentedBoard::standard();
        board.set_test_mode(true);
        Self::from_board(board, Color::White, CastlingRights::ALL, 0)
    }

    /// Start from an arbitrary legal position. The board is in test mode.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let setup = fen::parse(fen)?;
        Ok(Self::from_board(
            setup.board,
            setup.side_to_move,
            setup.castling,
            setup.halfmove_clock,
        ))
    }

    fn from_board(
        board: AugmentedBoard,
        side_to_move: Color,
        castling: CastlingRights,
        fifty_move_counter: u32,
    ) -> Self {
        let control = ControlMap::build(&board, !side_to_move);
        let movegen = MoveGenerator::new(&board, side_to_move, &control, castling);
        let mut game = ChessGame {
            board,
            control,
            movegen,
            status: GameStatus::to_move(side_to_move),
            side_to_move,
            history: Vec::new(),
            fifty_move_counter,
            repetition: [Vec::new(), Vec::new()],
            castling,
        };
        game.settle();
        game
    }

    // -- accessors ------------------------------------------------------

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_active_game(&self) -> bool {
        self.status.is_active()
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn is_player_to_move_in_check(&self) -> bool {
        self.control.gives_check()
    }

    pub fn move_history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn fifty_move_counter(&self) -> u32 {
        self.fifty_move_counter
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// Copy of the piece at `c`.
    pub fn piece_at(&self, c: Coords) -> Option<Piece> {
        self.board.piece_at(c).copied()
    }

    /// Coordinates of the piece with `id`, if it is still on the board.
    pub fn coords_of(&self, id: PieceId) -> Option<Coords> {
        self.board.pieces(id.color()).coords_of(id)
    }

    /// Legal destinations for the piece at `c`; empty unless it belongs to
    /// the side to move.
    pub fn legal_destinations(&self, c: Coords) -> Vec<Coords> {
        self.movegen
            .destinations(c)
            .map(<[Coords]>::to_vec)
            .unwrap_or_default()
    }

    /// Every legal `(from, to)` pair for the side to move.
    pub fn legal_moves(&self) -> Vec<(Coords, Coords)> {
        if !self.is_active_game() {
            return Vec::new();
        }
        self.movegen
            .iter()
            .flat_map(|(from, dests)| dests.iter().map(move |&to| (from, to)))
            .collect()
    }

    /// Whether moving from `from` to `to` is a pawn reaching its back rank.
    pub fn is_promotion_move(&self, from: Coords, to: Coords) -> bool {
        self.board
            .piece_at(from)
            .is_some_and(|p| p.kind == PieceType::Pawn && to.rank == p.color().back_rank())
    }

    /// Panics if the board and piece lists have drifted apart, or if either
    /// king has left the board.
    pub fn assert_consistent(&self) {
        self.board.assert_consistent();
        for color in [Color::White, Color::Black] {
            assert!(
                self.board.king_coords(color).is_some(),
                "{color} king is missing from the board"
            );
        }
    }

    // -- moves ----------------------------------------------------------

    /// Validate and apply one move for the side to move.
    ///
    /// Coordinates are taken as raw `[rank, file]` pairs from the client.
    /// Any rejection leaves the board untouched and reports the mover's
    /// rejected status. Once the game is over this is a no-op.
    pub fn play_move(
        &mut self,
        from: [i32; 2],
        to: [i32; 2],
        promote_to: Option<PieceType>,
    ) -> GameStatus {
        if !self.is_active_game() {
            return self.status;
        }
        let side = self.side_to_move;

        let (Some(from), Some(to)) = (Coords::from_pair(from), Coords::from_pair(to)) else {
            return self.reject();
        };
        if from == to {
            return self.reject();
        }
        let Some(piece) = self.board.piece_at(from).copied() else {
            return self.reject();
        };
        if piece.color() != side || !self.movegen.is_valid_move(from, to) {
            return self.reject();
        }
        let promotion = if self.is_promotion_move(from, to) {
            match promote_to {
                Some(kind) if kind.is_promotion_target() => Some(kind),
                _ => return self.reject(),
            }
        } else {
            None
        };

        self.board.clear_transient_flags();
        let record = match piece.kind {
            PieceType::Pawn => self.move_pawn(piece, from, to, promotion),
            PieceType::King => self.move_king(piece, from, to),
            _ => self.move_other(piece, from, to),
        };

        let before = self.castling;
        if piece.kind == PieceType::King {
            self.castling.revoke_both(side);
        }
        self.castling.revoke_corner(from);
        self.castling.revoke_corner(to);

        let irreversible = record.captured.is_some() || piece.kind == PieceType::Pawn;
        if irreversible {
            self.fifty_move_counter = 0;
        } else {
            self.fifty_move_counter += 1;
        }
        if irreversible || self.castling != before {
            self.repetition = [Vec::new(), Vec::new()];
        }
        self.history.push(record);

        self.control = ControlMap::build(&self.board, side);
        self.side_to_move = !side;
        self.movegen = MoveGenerator::new(&self.board, !side, &self.control, self.castling);
        self.settle();
        self.status
    }

    fn reject(&mut self) -> GameStatus {
        self.status = GameStatus::rejected(self.side_to_move);
        self.status
    }

    fn capture_at(&mut self, c: Coords) -> Option<PieceId> {
        self.board.piece_at(c)?;
        Some(self.board.remove_piece(c).id)
    }

    fn move_pawn(
        &mut self,
        piece: Piece,
        from: Coords,
        to: Coords,
        promotion: Option<PieceType>,
    ) -> MoveRecord {
        let en_passant = self.movegen.is_en_passant(from, to);
        let captured = if en_passant {
            self.capture_at(Coords::new(from.rank, to.file))
        } else {
            self.capture_at(to)
        };
        self.board.move_piece(from, to);
        if let Some(kind) = promotion {
            self.board.promote_piece(to, kind);
        }
        if from.rank.abs_diff(to.rank) == 2 {
            self.board.mark_en_passant(to);
        }
        MoveRecord {
            piece: piece.id,
            piece_type: piece.kind,
            from,
            to,
            captured,
            promotion,
            castling: false,
            en_passant,
        }
    }

    fn move_king(&mut self, piece: Piece, from: Coords, to: Coords) -> MoveRecord {
        let captured = self.capture_at(to);
        self.board.move_piece(from, to);
        let castling = from.file.abs_diff(to.file) == 2;
        if castling {
            let (rook_from, rook_to) = if to.file == 6 { (7, 5) } else { (0, 3) };
            self.board
                .move_piece(Coords::new(from.rank, rook_from), Coords::new(from.rank, rook_to));
        }
        MoveRecord {
            piece: piece.id,
            piece_type: piece.kind,
            from,
            to,
            captured,
            promotion: None,
            castling,
            en_passant: false,
        }
    }

    fn move_other(&mut self, piece: Piece, from: Coords, to: Coords) -> MoveRecord {
        let captured = self.capture_at(to);
        self.board.move_piece(from, to);
        MoveRecord {
            piece: piece.id,
            piece_type: piece.kind,
            from,
            to,
            captured,
            promotion: None,
            castling: false,
            en_passant: false,
        }
    }

    /// Decide the status of the freshly generated position.
    fn settle(&mut self) {
        let side = self.side_to_move;
        if !self.movegen.has_valid_moves() {
            self.status = if self.control.gives_check() {
                GameStatus::checkmate_by(!side)
            } else {
                GameStatus::DrawByStalemate
            };
            return;
        }

        let occurrences = if self.movegen.en_passant_available() {
            0
        } else {
            self.record_position()
        };

        self.status = if self.fifty_move_counter >= FIFTY_MOVE_LIMIT {
            GameStatus::DrawByFiftyMoveRule
        } else if occurrences >= 3 {
            GameStatus::DrawByThreefoldRepetition
        } else if self.is_insufficient_material() {
            GameStatus::DrawByInsufficientMaterial
        } else {
            GameStatus::to_move(side)
        };
    }

    /// Count the current position in the side to move's history.
    fn record_position(&mut self) -> u8 {
        let mut snapshot: Vec<(Coords, Color, PieceType)> = [Color::White, Color::Black]
            .into_iter()
            .flat_map(|color| {
                self.board
                    .material(color)
                    .into_iter()
                    .map(move |(c, kind)| (c, color, kind))
            })
            .collect();
        snapshot.sort_by_key(|(c, _, _)| *c);

        let history = &mut self.repetition[self.side_to_move.index()];
        match history.iter_mut().find(|r| r.snapshot == snapshot) {
            Some(record) => {
                record.count += 1;
                record.count
            }
            None => {
                history.push(PositionRecord { snapshot, count: 1 });
                1
            }
        }
    }

    fn material(&self, color: Color) -> Material {
        let mut knights = 0;
        let mut bishops = 0;
        for (_, kind) in self.board.material(color) {
            match kind {
                PieceType::King => {}
                PieceType::Knight => knights += 1,
                PieceType::Bishop => bishops += 1,
                _ => return Material::Sufficient,
            }
        }
        match (knights, bishops) {
            (0, 0) => Material::KingAlone,
            (1, 0) | (0, 1) => Material::OneMinor,
            (2, 0) => Material::TwoKnights,
            (0, 2) | (1, 1) => Material::TwoMinors,
            _ => Material::Sufficient,
        }
    }

    /// Both sides bare or with one minor piece, or a bare king against two
    /// knights.
    fn is_insufficient_material(&self) -> bool {
        use Material::*;
        matches!(
            (self.material(Color::White), self.material(Color::Black)),
            (KingAlone | OneMinor, KingAlone | OneMinor)
                | (KingAlone, TwoKnights)
                | (TwoKnights, KingAlone)
        )
    }

    /// Whether `color` has nothing but its king and at most two minor
    /// pieces. Decides a timeout by the other side.
    fn cannot_mate(&self, color: Color) -> bool {
        self.material(color) != Material::Sufficient
    }

    // -- administrative endings -----------------------------------------

    fn conclude(&mut self, status: GameStatus) {
        if self.is_active_game() {
            self.status = status;
        }
    }

    pub fn white_resigns(&mut self) {
        self.conclude(GameStatus::BlackWinsByResignation);
    }

    pub fn black_resigns(&mut self) {
        self.conclude(GameStatus::WhiteWinsByResignation);
    }

    pub fn white_timeout(&mut self) {
        let status = if self.cannot_mate(Color::Black) {
            GameStatus::DrawByTimeoutVsInsufficientMaterial
        } else {
            GameStatus::BlackWinsByTimeout
        };
        self.conclude(status);
    }

    pub fn black_timeout(&mut self) {
        let status = if self.cannot_mate(Color::White) {
            GameStatus::DrawByTimeoutVsInsufficientMaterial
        } else {
            GameStatus::WhiteWinsByTimeout
        };
        self.conclude(status);
    }

    pub fn white_abandons_game(&mut self) {
        self.conclude(GameStatus::BlackWinsByAbandonment);
    }

    pub fn black_abandons_game(&mut self) {
        self.conclude(GameStatus::WhiteWinsByAbandonment);
    }

    pub fn draw_via_agreement(&mut self) {
        self.conclude(GameStatus::DrawByAgreement);
    }

    // -- snapshot -------------------------------------------------------

    /// Player-facing copy of the position. Only the side to move gets legal
    /// destinations, and only while the game is active.
    pub fn current_game_state(&self) -> GameStateRepresentation {
        let info = |color: Color| -> BTreeMap<PieceId, PieceInfo> {
            self.board
                .pieces(color)
                .iter()
                .filter_map(|(c, id)| {
                    let piece = self.board.piece_at(c)?;
                    let possible_moves = (color == self.side_to_move).then(|| {
                        if self.is_active_game() {
                            self.legal_destinations(c)
                        } else {
                            Vec::new()
                        }
                    });
                    Some((
                        id,
                        PieceInfo {
                            coords: c,
                            piece_type: piece.kind,
                            possible_moves,
                        },
                    ))
                })
                .collect()
        };
        GameStateRepresentation {
            game_status: self.status,
            player_to_move_color: self.side_to_move,
            player_to_move_is_in_check: self.is_player_to_move_in_check(),
            white_piece_info: info(Color::White),
            black_piece_info: info(Color::Black),
        }
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn play(g: &mut ChessGame, from: [i32; 2], to: [i32; 2]) -> GameStatus {
        g.play_move(from, to, None)
    }

    #[test]
    fn new_game_is_active() {
        let g = ChessGame::new();
        assert_eq!(g.status(), GameStatus::WhiteToMove);
        assert!(g.is_active_game());
        assert_eq!(g.side_to_move(), Color::White);
        assert!(!g.is_player_to_move_in_check());
        assert_eq!(g.legal_moves().len(), 20);
    }

    #[test]
    fn accepted_move_flips_side() {
        let mut g = ChessGame::new();
        assert_eq!(play(&mut g, [1, 4], [3, 4]), GameStatus::BlackToMove);
        assert_eq!(g.side_to_move(), Color::Black);
        let rec = &g.move_history()[0];
        assert_eq!(rec.piece, PieceId(4));
        assert_eq!(rec.from, Coords::new(1, 4));
        assert!(g.piece_at(Coords::new(3, 4)).unwrap().en_passant);
        g.assert_consistent();
    }

    #[test]
    fn rejections_leave_board_unchanged() {
        let mut g = ChessGame::new();
        let before = g.current_game_state();
        assert_eq!(play(&mut g, [8, 0], [1, 0]), GameStatus::WhiteMoveRejected);
        assert_eq!(play(&mut g, [1, 0], [1, 0]), GameStatus::WhiteMoveRejected);
        assert_eq!(play(&mut g, [3, 3], [4, 3]), GameStatus::WhiteMoveRejected);
        assert_eq!(play(&mut g, [6, 0], [5, 0]), GameStatus::WhiteMoveRejected);
        assert_eq!(play(&mut g, [0, 0], [2, 0]), GameStatus::WhiteMoveRejected);
        assert_eq!(g.side_to_move(), Color::White);
        let after = g.current_game_state();
        assert_eq!(before.white_piece_info, after.white_piece_info);
        assert_eq!(before.black_piece_info, after.black_piece_info);
        // A legal move after a rejection is still accepted.
        assert_eq!(play(&mut g, [1, 0], [2, 0]), GameStatus::BlackToMove);
        assert_eq!(play(&mut g, [1, 1], [2, 1]), GameStatus::BlackMoveRejected);
    }

    #[test]
    fn fools_mate() {
        let mut g = ChessGame::new();
        // Mirror image with black mating: f3, e5, g4, Qh4#.
        play(&mut g, [1, 5], [2, 5]);
        play(&mut g, [6, 4], [4, 4]);
        play(&mut g, [1, 6], [3, 6]);
        assert_eq!(play(&mut g, [7, 3], [3, 7]), GameStatus::BlackWinsByCheckmate);
        assert!(!g.is_active_game());
        assert!(g.is_player_to_move_in_check());
        assert!(g.legal_moves().is_empty());
    }

    #[test]
    fn terminal_state_is_absorbing() {
        let mut g = ChessGame::new();
        g.white_resigns();
        assert_eq!(g.status(), GameStatus::BlackWinsByResignation);
        assert_eq!(play(&mut g, [1, 4], [3, 4]), GameStatus::BlackWinsByResignation);
        assert!(g.piece_at(Coords::new(1, 4)).is_some());
        g.draw_via_agreement();
        g.black_timeout();
        assert_eq!(g.status(), GameStatus::BlackWinsByResignation);
    }

    #[test]
    fn administrative_endings() {
        let cases: [(fn(&mut ChessGame), GameStatus); 7] = [
            (ChessGame::white_resigns, GameStatus::BlackWinsByResignation),
            (ChessGame::black_resigns, GameStatus::WhiteWinsByResignation),
            (ChessGame::white_timeout, GameStatus::BlackWinsByTimeout),
            (ChessGame::black_timeout, GameStatus::WhiteWinsByTimeout),
            (ChessGame::white_abandons_game, GameStatus::BlackWinsByAbandonment),
            (ChessGame::black_abandons_game, GameStatus::WhiteWinsByAbandonment),
            (ChessGame::draw_via_agreement, GameStatus::DrawByAgreement),
        ];
        for (action, expected) in cases {
            let mut g = ChessGame::new();
            action(&mut g);
            assert_eq!(g.status(), expected);
        }
    }

    #[test]
    fn timeout_against_insufficient_material_is_a_draw() {
        // White flags, but black only has a knight.
        let mut g = ChessGame::from_fen("4k3/8/8/5n2/8/8/8/R3K3 w - - 0 1").unwrap();
        g.white_timeout();
        assert_eq!(g.status(), GameStatus::DrawByTimeoutVsInsufficientMaterial);

        // Black flags and white has a rook: ordinary loss.
        let mut g = ChessGame::from_fen("4k3/8/8/5n2/8/8/8/R3K3 w - - 0 1").unwrap();
        g.black_timeout();
        assert_eq!(g.status(), GameStatus::WhiteWinsByTimeout);
    }

    #[test]
    fn timeout_counts_up_to_two_minor_pieces() {
        for fen in [
            "4k3/p7/8/8/8/8/8/1NB1K3 w - - 0 1",
            "4k3/p7/8/8/8/8/8/2B1KB2 w - - 0 1",
            "4k3/p7/8/8/8/8/8/1N2K1N1 w - - 0 1",
        ] {
            let mut g = ChessGame::from_fen(fen).unwrap();
            assert!(g.is_active_game(), "{fen} should still be playable");
            g.black_timeout();
            assert_eq!(
                g.status(),
                GameStatus::DrawByTimeoutVsInsufficientMaterial,
                "{fen}"
            );
        }

        // Three minor pieces are enough to win on time.
        let mut g = ChessGame::from_fen("4k3/p7/8/8/8/8/8/1NB1KB2 w - - 0 1").unwrap();
        g.black_timeout();
        assert_eq!(g.status(), GameStatus::WhiteWinsByTimeout);
    }

    #[test]
    fn promotion_requires_type_and_keeps_id() {
        let mut g = ChessGame::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let id = g.piece_at(Coords::new(6, 4)).unwrap().id;
        assert_eq!(play(&mut g, [6, 4], [7, 4]), GameStatus::WhiteMoveRejected);
        assert_eq!(
            g.play_move([6, 4], [7, 4], Some(PieceType::King)),
            GameStatus::WhiteMoveRejected
        );
        assert_eq!(
            g.play_move([6, 4], [7, 4], Some(PieceType::Queen)),
            GameStatus::BlackToMove
        );
        let promoted = g.piece_at(Coords::new(7, 4)).unwrap();
        assert_eq!(promoted.id, id);
        assert_eq!(promoted.kind, PieceType::Queen);
        assert_eq!(g.move_history()[0].promotion, Some(PieceType::Queen));
    }

    #[test]
    fn castling_moves_rook_and_drops_rights() {
        let mut g = ChessGame::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut g, [0, 4], [0, 6]);
        assert_eq!(g.piece_at(Coords::new(0, 5)).unwrap().kind, PieceType::Rook);
        assert!(g.piece_at(Coords::new(0, 7)).is_none());
        assert!(g.move_history()[0].castling);
        let cr = g.castling_rights();
        assert!(!cr.white_kingside && !cr.white_queenside);

        play(&mut g, [7, 4], [7, 2]);
        assert_eq!(g.piece_at(Coords::new(7, 3)).unwrap().kind, PieceType::Rook);
        assert_eq!(g.piece_at(Coords::new(7, 2)).unwrap().kind, PieceType::King);
        assert_eq!(g.castling_rights(), CastlingRights::NONE);
        g.assert_consistent();
    }

    #[test]
    fn rook_capture_on_corner_drops_right() {
        let mut g = ChessGame::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut g, [0, 7], [7, 7]);
        let cr = g.castling_rights();
        assert!(!cr.white_kingside);
        assert!(!cr.black_kingside);
        assert!(cr.white_queenside && cr.black_queenside);
    }

    #[test]
    fn en_passant_removes_captured_pawn() {
        let mut g = ChessGame::new();
        play(&mut g, [1, 4], [3, 4]);
        play(&mut g, [6, 0], [5, 0]);
        play(&mut g, [3, 4], [4, 4]);
        play(&mut g, [6, 3], [4, 3]);
        assert!(g.legal_destinations(Coords::new(4, 4)).contains(&Coords::new(5, 3)));
        assert_eq!(play(&mut g, [4, 4], [5, 3]), GameStatus::BlackToMove);
        assert!(g.piece_at(Coords::new(4, 3)).is_none());
        let rec = g.move_history().last().unwrap();
        assert!(rec.en_passant);
        assert_eq!(rec.captured, Some(PieceId(19)));
        assert_eq!(g.fifty_move_counter(), 0);
        g.assert_consistent();
    }

    #[test]
    fn en_passant_expires_after_one_ply() {
        let mut g = ChessGame::new();
        play(&mut g, [1, 4], [3, 4]);
        play(&mut g, [6, 0], [5, 0]);
        play(&mut g, [3, 4], [4, 4]);
        play(&mut g, [6, 3], [4, 3]);
        play(&mut g, [1, 0], [2, 0]);
        play(&mut g, [5, 0], [4, 0]);
        assert!(!g.legal_destinations(Coords::new(4, 4)).contains(&Coords::new(5, 3)));
    }

    #[test]
    fn stalemate() {
        let mut g = ChessGame::from_fen("k7/8/1Q6/8/8/8/8/2K5 w - - 0 1").unwrap();
        // Qb6-c7 leaves the a8 king without moves.
        assert_eq!(play(&mut g, [5, 1], [6, 2]), GameStatus::DrawByStalemate);
    }

    #[test]
    fn fifty_move_rule_from_clock() {
        let mut g = ChessGame::from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 99 80").unwrap();
        assert_eq!(play(&mut g, [0, 0], [0, 1]), GameStatus::DrawByFiftyMoveRule);
    }

    #[test]
    fn fifty_move_counter_resets_on_pawn_move() {
        let mut g = ChessGame::from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 98 80").unwrap();
        play(&mut g, [1, 4], [2, 4]);
        assert_eq!(g.fifty_move_counter(), 0);
        assert!(g.is_active_game());
    }

    #[test]
    fn threefold_repetition() {
        let mut g = ChessGame::new();
        for _ in 0..2 {
            assert!(play(&mut g, [0, 6], [2, 5]).is_active());
            play(&mut g, [7, 6], [5, 5]);
            play(&mut g, [2, 5], [0, 6]);
            play(&mut g, [5, 5], [7, 6]);
        }
        assert_eq!(g.status(), GameStatus::DrawByThreefoldRepetition);
    }

    #[test]
    fn insufficient_material_policy() {
        let draws = [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/2n5/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1N2K1N1 w - - 0 1",
        ];
        for fen in draws {
            let g = ChessGame::from_fen(fen).unwrap();
            assert_eq!(g.status(), GameStatus::DrawByInsufficientMaterial, "{fen}");
        }
        let playable = [
            "4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "4k3/8/8/3n4/8/8/8/1N2K1N1 w - - 0 1",
        ];
        for fen in playable {
            let g = ChessGame::from_fen(fen).unwrap();
            assert!(g.is_active_game(), "{fen}");
        }
    }

    #[test]
    fn capture_reaching_insufficient_material() {
        let mut g = ChessGame::from_fen("4k3/8/8/8/8/8/3r4/4K3 w - - 0 1").unwrap();
        assert_eq!(
            play(&mut g, [0, 4], [1, 3]),
            GameStatus::DrawByInsufficientMaterial
        );
    }

    #[test]
    fn snapshot_lists_moves_only_for_mover() {
        let g = ChessGame::new();
        let state = g.current_game_state();
        assert_eq!(state.white_piece_info.len(), 16);
        let knight = &state.white_piece_info[&PieceId(9)];
        assert_eq!(knight.coords, Coords::new(0, 1));
        assert_eq!(knight.possible_moves.as_ref().unwrap().len(), 2);
        assert!(state.black_piece_info[&PieceId(25)].possible_moves.is_none());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["gameStatus"], 0);
        assert_eq!(json["playerToMoveColor"], "white");
        assert_eq!(json["whitePieceInfo"]["12"]["type"], "king");
        assert_eq!(json["whitePieceInfo"]["12"]["coords"], serde_json::json!([0, 4]));
    }
}
