//! WebSocket envelopes.
//!
//! Both directions use `{"event": "<name>", "payload": {...}}`. Events
//! without a payload omit the `payload` key.

use serde::{Deserialize, Serialize};

use crate::session::{
    DrawState, MoveInfo, PlayerGameState, UserState, UserStatus, UsersError, VersionInfo,
};

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ClientCommand {
    #[serde(rename = "queue:join")]
    JoinQueue,
    #[serde(rename = "queue:leave")]
    LeaveQueue,

    #[serde(rename = "game:play-move", rename_all = "camelCase")]
    PlayMove {
        #[serde(default)]
        move_info: Option<MoveInfo>,
        game_state_version: u64,
    },
    #[serde(rename = "game:draw:make-offer", rename_all = "camelCase")]
    OfferDraw { draw_state_version: u64 },
    #[serde(rename = "game:draw:reset-offers", rename_all = "camelCase")]
    ResetDrawOffers { draw_state_version: u64 },
    #[serde(rename = "game:draw:no-offers", rename_all = "camelCase")]
    NoDrawOffers { draw_state_version: u64 },
    #[serde(rename = "game:draw:want-offers", rename_all = "camelCase")]
    WantDrawOffers { draw_state_version: u64 },
    #[serde(rename = "game:resign")]
    Resign,

    #[serde(rename = "game:recover-state")]
    RecoverState,
    #[serde(rename = "game:recover-game-state")]
    RecoverGameState,
    #[serde(rename = "game:recover-draw-state")]
    RecoverDrawState,
    #[serde(rename = "game:get-version-info")]
    GetVersionInfo,

    #[serde(rename = "user:get-user-state")]
    GetUserState,
    #[serde(rename = "user:get-game-status")]
    GetGameStatus,
    #[serde(rename = "user:get-new-name")]
    GetNewName,
}

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "queue:joined")]
    QueueJoined,
    #[serde(rename = "queue:left")]
    QueueLeft,
    #[serde(rename = "queue:failure")]
    QueueFailure(Failure),

    #[serde(rename = "game:joined")]
    GameJoined(FullGameState),
    #[serde(rename = "game:game-state-update")]
    GameStateUpdate(PlayerGameState),
    #[serde(rename = "game:draw-state-update")]
    DrawStateUpdate(DrawState),
    #[serde(rename = "game:current-state")]
    CurrentState(FullGameState),
    #[serde(rename = "game:current-game-state", rename_all = "camelCase")]
    CurrentGameState { game_state: PlayerGameState },
    #[serde(rename = "game:current-draw-state", rename_all = "camelCase")]
    CurrentDrawState { draw_state: DrawState },
    #[serde(rename = "game:current-version-info", rename_all = "camelCase")]
    CurrentVersionInfo { version_info: VersionInfo },
    #[serde(rename = "game:not-found")]
    GameNotFound(Failure),
    #[serde(rename = "game:finished")]
    GameFinished,
    #[serde(rename = "game:move-failure")]
    MoveFailure { code: u8 },
    #[serde(rename = "game:no-draw-state-change")]
    NoDrawStateChange,
    #[serde(rename = "game:game-state-out-of-sync")]
    GameStateOutOfSync,
    #[serde(rename = "game:draw-state-out-of-sync")]
    DrawStateOutOfSync,

    #[serde(rename = "user:current-state")]
    UserCurrentState(UserState),
    #[serde(rename = "user:current-game-status")]
    UserCurrentGameStatus(UserStatus),
    #[serde(rename = "user:new-name")]
    UserNewName(String),
    #[serde(rename = "user:not-found")]
    UserNotFound(Failure),

    #[serde(rename = "error")]
    Error { message: String },
}

/// Registry failure as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub code: u8,
    pub message: String,
}

impl From<&UsersError> for Failure {
    fn from(err: &UsersError) -> Self {
        Failure {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerName {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerNames {
    pub white: PlayerName,
    pub black: PlayerName,
}

/// Everything a participant needs to render a game from scratch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullGameState {
    pub game_state: PlayerGameState,
    pub draw_state: DrawState,
    pub user_state: PlayerNames,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"event":"error","payload":{"message":"serialization failed"}}"#.to_string()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::OnlineGame;
    use serde_json::Value;

    fn parse(evt: &ServerEvent) -> Value {
        serde_json::from_str(&evt.to_json()).unwrap()
    }

    #[test]
    fn unit_commands_need_no_payload() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"event":"queue:join"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::JoinQueue);
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"event":"game:resign","payload":null}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Resign);
    }

    #[test]
    fn play_move_deserializes() {
        let json = r#"{"event":"game:play-move","payload":{
            "moveInfo":{"from":[1,4],"to":[3,4]},"gameStateVersion":3}}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::PlayMove {
                move_info: Some(MoveInfo::new([1, 4], [3, 4])),
                game_state_version: 3,
            }
        );

        let json = r#"{"event":"game:play-move","payload":{"gameStateVersion":0}}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, ClientCommand::PlayMove { move_info: None, .. }));
    }

    #[test]
    fn draw_commands_deserialize() {
        let json = r#"{"event":"game:draw:want-offers","payload":{"drawStateVersion":2}}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ClientCommand::WantDrawOffers { draw_state_version: 2 });
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"event":"game:undo"}"#).is_err());
        assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
    }

    #[test]
    fn unit_event_has_only_name() {
        let v = parse(&ServerEvent::QueueJoined);
        assert_eq!(v["event"], "queue:joined");
        assert!(v.get("payload").is_none());
    }

    #[test]
    fn failure_event_carries_code() {
        let v = parse(&ServerEvent::QueueFailure((&UsersError::AlreadyQueued).into()));
        assert_eq!(v["event"], "queue:failure");
        assert_eq!(v["payload"]["code"], 1);
        assert_eq!(v["payload"]["message"], "already in matchmaking queue");

        let v = parse(&ServerEvent::MoveFailure { code: 2 });
        assert_eq!(v["payload"]["code"], 2);
    }

    #[test]
    fn game_joined_event_shape() {
        let game = OnlineGame::with_colors("w".into(), "b".into());
        let evt = ServerEvent::GameJoined(FullGameState {
            game_state: game.current_game_state("w"),
            draw_state: game.current_draw_state(),
            user_state: PlayerNames {
                white: PlayerName { username: "A".into() },
                black: PlayerName { username: "B".into() },
            },
        });
        let v = parse(&evt);
        assert_eq!(v["event"], "game:joined");
        assert_eq!(v["payload"]["gameState"]["playerColor"], "white");
        assert_eq!(v["payload"]["gameState"]["gameStatus"], 0);
        assert_eq!(v["payload"]["drawState"]["version"], 0);
        assert_eq!(v["payload"]["userState"]["black"]["username"], "B");
    }

    #[test]
    fn version_info_event_shape() {
        let game = OnlineGame::with_colors("w".into(), "b".into());
        let v = parse(&ServerEvent::CurrentVersionInfo {
            version_info: game.version_info(),
        });
        assert_eq!(v["payload"]["versionInfo"]["gameState"], 0);
        assert_eq!(v["payload"]["versionInfo"]["drawState"], 0);
    }

    #[test]
    fn user_events() {
        let v = parse(&ServerEvent::UserCurrentGameStatus(UserStatus::Queued));
        assert_eq!(v["payload"], 1);
        let v = parse(&ServerEvent::UserNewName("SwiftOtter".into()));
        assert_eq!(v["payload"], "SwiftOtter");
        let v = parse(&ServerEvent::error("bad frame"));
        assert_eq!(v["event"], "error");
        assert_eq!(v["payload"]["message"], "bad frame");
    }
}
