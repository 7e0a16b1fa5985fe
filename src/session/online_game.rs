//! One live game between two fixed users.
//!
//! Wraps a [`ChessGame`] with draw negotiation and two optimistic-concurrency
//! counters. Clients send the version they last saw with every action; a
//! stale version is rejected so the client can resynchronise and retry.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{ChessGame, Color, GameStateRepresentation, GameStatus, PieceType};

/// Opaque user identifier assigned by the external auth layer.
pub type UserId = String;

/// Identifier of an [`OnlineGame`].
pub type GameId = Uuid;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an action left the game state unchanged. Codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoChangeReason {
    #[error("white attempted to move on black's turn")]
    WhiteMovedOnBlackTurn,
    #[error("black attempted to move on white's turn")]
    BlackMovedOnWhiteTurn,
    #[error("move supplied was not valid")]
    InvalidMove,
    #[error("draw action did not change the game state")]
    NonConclusiveDrawAction,
    #[error("game state version does not match")]
    GameStateVersionMismatch,
    #[error("game has finished")]
    GameFinished,
    #[error("draw state version does not match")]
    DrawStateVersionMismatch,
}

impl NoChangeReason {
    pub fn code(self) -> u8 {
        match self {
            NoChangeReason::WhiteMovedOnBlackTurn => 0,
            NoChangeReason::BlackMovedOnWhiteTurn => 1,
            NoChangeReason::InvalidMove => 2,
            NoChangeReason::NonConclusiveDrawAction => 3,
            NoChangeReason::GameStateVersionMismatch => 4,
            NoChangeReason::GameFinished => 5,
            NoChangeReason::DrawStateVersionMismatch => 6,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire-facing state
// ---------------------------------------------------------------------------

/// A move as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInfo {
    pub from: [i32; 2],
    pub to: [i32; 2],
    /// Lowercase piece name; unknown names count as missing.
    #[serde(default)]
    pub promote_to: Option<String>,
}

impl MoveInfo {
    pub fn new(from: [i32; 2], to: [i32; 2]) -> Self {
        MoveInfo {
            from,
            to,
            promote_to: None,
        }
    }

    pub fn promoting(from: [i32; 2], to: [i32; 2], piece: PieceType) -> Self {
        MoveInfo {
            from,
            to,
            promote_to: Some(piece.to_string()),
        }
    }

    fn promotion(&self) -> Option<PieceType> {
        self.promote_to
            .as_deref()
            .and_then(|name| PieceType::from_name(name).ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub game_state: u64,
    pub draw_state: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDrawState {
    pub offers_draw: bool,
    pub wants_draw_offers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawState {
    pub white: PlayerDrawState,
    pub black: PlayerDrawState,
    pub version: u64,
}

/// Game state as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameState {
    #[serde(flatten)]
    pub state: GameStateRepresentation,
    pub player_color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameUsers {
    pub white: UserId,
    pub black: UserId,
}

// ---------------------------------------------------------------------------
// OnlineGame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OnlineGame {
    game_id: GameId,
    created_at: DateTime<Utc>,
    chess_game: ChessGame,
    white: UserId,
    black: UserId,
    draw_offers: [bool; 2],
    wants_draw_offers: [bool; 2],
    version: VersionInfo,
    last_outcome: Result<(), NoChangeReason>,
}

impl OnlineGame {
    /// Pair two users, assigning colors by coin flip.
    pub fn new(user1: UserId, user2: UserId) -> Self {
        if rand::thread_rng().gen_bool(0.5) {
            Self::with_colors(user1, user2)
        } else {
            Self::with_colors(user2, user1)
        }
    }

    /// Pair two users with fixed colors.
    pub fn with_colors(white: UserId, black: UserId) -> Self {
        Self::from_chess_game(white, black, ChessGame::new())
    }

    /// Wrap an existing game, e.g. one loaded from FEN.
    pub fn from_chess_game(white: UserId, black: UserId, chess_game: ChessGame) -> Self {
        OnlineGame {
            game_id: Uuid::now_v7(),
            created_at: Utc::now(),
            chess_game,
            white,
            black,
            draw_offers: [false; 2],
            wants_draw_offers: [true; 2],
            version: VersionInfo {
                game_state: 0,
                draw_state: 0,
            },
            last_outcome: Ok(()),
        }
    }

    // -- game actions ---------------------------------------------------

    /// Play `mv` for `user`, who must be to move, against `game_state_version`.
    pub fn play_move(
        &mut self,
        user: &str,
        mv: Option<&MoveInfo>,
        game_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        let outcome = self.try_play_move(user, mv, game_state_version);
        self.finish(outcome)
    }

    fn try_play_move(
        &mut self,
        user: &str,
        mv: Option<&MoveInfo>,
        game_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        self.ensure_active()?;
        if game_state_version != self.version.game_state {
            return Err(NoChangeReason::GameStateVersionMismatch);
        }
        match (self.color_of(user), self.chess_game.side_to_move()) {
            (Color::White, Color::Black) => return Err(NoChangeReason::WhiteMovedOnBlackTurn),
            (Color::Black, Color::White) => return Err(NoChangeReason::BlackMovedOnWhiteTurn),
            _ => {}
        }
        let mv = mv.ok_or(NoChangeReason::InvalidMove)?;
        let status = self.chess_game.play_move(mv.from, mv.to, mv.promotion());
        if matches!(
            status,
            GameStatus::WhiteMoveRejected | GameStatus::BlackMoveRejected
        ) {
            return Err(NoChangeReason::InvalidMove);
        }
        self.version.game_state += 1;
        Ok(())
    }

    pub fn player_offers_draw(
        &mut self,
        user: &str,
        draw_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        let outcome = self.draw_action(draw_state_version, |game| {
            if game.is_draw_offers_disabled() {
                return Err(NoChangeReason::NonConclusiveDrawAction);
            }
            let slot = game.color_of(user).index();
            if !game.draw_offers[slot] {
                game.draw_offers[slot] = true;
                game.version.draw_state += 1;
            }
            if game.draw_offers == [true, true] {
                game.chess_game.draw_via_agreement();
                game.version.game_state += 1;
                return Ok(());
            }
            Err(NoChangeReason::NonConclusiveDrawAction)
        });
        self.finish(outcome)
    }

    /// Withdraw every standing offer. Allowed whether or not offers are
    /// enabled.
    pub fn player_resets_draw_agreement(
        &mut self,
        user: &str,
        draw_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        self.assert_participant(user);
        let outcome = self.draw_action(draw_state_version, |game| {
            if game.draw_offers != [false, false] {
                game.draw_offers = [false, false];
                game.version.draw_state += 1;
            }
            Err(NoChangeReason::NonConclusiveDrawAction)
        });
        self.finish(outcome)
    }

    /// Opt out of draw offers; withdraws every standing offer.
    pub fn player_does_not_want_draw_offers(
        &mut self,
        user: &str,
        draw_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        let outcome = self.draw_action(draw_state_version, |game| {
            let slot = game.color_of(user).index();
            game.set_wants_draw_offers(slot, false);
            Err(NoChangeReason::NonConclusiveDrawAction)
        });
        self.finish(outcome)
    }

    /// Opt back in to draw offers; withdraws every standing offer unless
    /// both players already accept offers.
    pub fn player_wants_draw_offers(
        &mut self,
        user: &str,
        draw_state_version: u64,
    ) -> Result<(), NoChangeReason> {
        let outcome = self.draw_action(draw_state_version, |game| {
            if game.wants_draw_offers == [true, true] {
                return Err(NoChangeReason::NonConclusiveDrawAction);
            }
            let slot = game.color_of(user).index();
            game.set_wants_draw_offers(slot, true);
            Err(NoChangeReason::NonConclusiveDrawAction)
        });
        self.finish(outcome)
    }

    fn set_wants_draw_offers(&mut self, slot: usize, wants: bool) {
        let changed = self.wants_draw_offers[slot] != wants;
        let had_offers = self.draw_offers != [false, false];
        self.draw_offers = [false, false];
        self.wants_draw_offers[slot] = wants;
        if changed || had_offers {
            self.version.draw_state += 1;
        }
    }

    fn draw_action(
        &mut self,
        draw_state_version: u64,
        action: impl FnOnce(&mut Self) -> Result<(), NoChangeReason>,
    ) -> Result<(), NoChangeReason> {
        self.ensure_active()?;
        if draw_state_version != self.version.draw_state {
            return Err(NoChangeReason::DrawStateVersionMismatch);
        }
        action(self)
    }

    pub fn player_resigns(&mut self, user: &str) -> Result<(), NoChangeReason> {
        self.conclude(user, ChessGame::white_resigns, ChessGame::black_resigns)
    }

    pub fn player_abandons(&mut self, user: &str) -> Result<(), NoChangeReason> {
        self.conclude(
            user,
            ChessGame::white_abandons_game,
            ChessGame::black_abandons_game,
        )
    }

    pub fn player_timeout(&mut self, user: &str) -> Result<(), NoChangeReason> {
        self.conclude(user, ChessGame::white_timeout, ChessGame::black_timeout)
    }

    fn conclude(
        &mut self,
        user: &str,
        as_white: fn(&mut ChessGame),
        as_black: fn(&mut ChessGame),
    ) -> Result<(), NoChangeReason> {
        let outcome = self.ensure_active().map(|()| {
            match self.color_of(user) {
                Color::White => as_white(&mut self.chess_game),
                Color::Black => as_black(&mut self.chess_game),
            }
            self.version.game_state += 1;
        });
        self.finish(outcome)
    }

    fn ensure_active(&self) -> Result<(), NoChangeReason> {
        if self.is_active_game() {
            Ok(())
        } else {
            Err(NoChangeReason::GameFinished)
        }
    }

    fn finish(&mut self, outcome: Result<(), NoChangeReason>) -> Result<(), NoChangeReason> {
        self.last_outcome = outcome;
        outcome
    }

    /// Panics if `user` is not one of the two players.
    fn color_of(&self, user: &str) -> Color {
        match self.player_color(user) {
            Some(color) => color,
            None => panic!("user {user} is not part of game {}", self.game_id),
        }
    }

    fn assert_participant(&self, user: &str) {
        assert!(
            self.is_user_part_of_game(user),
            "user {user} is not part of game {}",
            self.game_id
        );
    }

    // -- queries --------------------------------------------------------

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn users(&self) -> GameUsers {
        GameUsers {
            white: self.white.clone(),
            black: self.black.clone(),
        }
    }

    pub fn is_user_part_of_game(&self, user: &str) -> bool {
        user == self.white || user == self.black
    }

    pub fn player_color(&self, user: &str) -> Option<Color> {
        if user == self.white {
            Some(Color::White)
        } else if user == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_active_game(&self) -> bool {
        self.chess_game.is_active_game()
    }

    pub fn status(&self) -> GameStatus {
        self.chess_game.status()
    }

    /// True once either player opted out, and always once the game is over.
    pub fn is_draw_offers_disabled(&self) -> bool {
        !self.is_active_game() || self.wants_draw_offers != [true, true]
    }

    /// Whether the last action changed the game state.
    pub fn game_state_has_changed(&self) -> bool {
        self.last_outcome.is_ok()
    }

    pub fn game_state_has_not_changed_reason(&self) -> Option<NoChangeReason> {
        self.last_outcome.err()
    }

    pub fn current_game_state(&self, user: &str) -> PlayerGameState {
        PlayerGameState {
            state: self.chess_game.current_game_state(),
            player_color: self.color_of(user),
        }
    }

    pub fn current_draw_state(&self) -> DrawState {
        let slot = |color: Color| PlayerDrawState {
            offers_draw: self.draw_offers[color.index()],
            wants_draw_offers: self.wants_draw_offers[color.index()],
        };
        DrawState {
            white: slot(Color::White),
            black: slot(Color::Black),
            version: self.version.draw_state,
        }
    }

    pub fn version_info(&self) -> VersionInfo {
        self.version
    }

    pub fn chess_game(&self) -> &ChessGame {
        &self.chess_game
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
