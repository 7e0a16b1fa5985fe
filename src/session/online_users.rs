//! Registry of connected users, the matchmaking queue and live games.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::session::names::random_name;
use crate::session::online_game::{GameId, OnlineGame, UserId};

/// Transport-level connection handle, unique per process.
pub type ConnectionId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a registry operation failed. Codes are stable and reach clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsersError {
    #[error("already in matchmaking queue")]
    AlreadyQueued,

    #[error("already in game")]
    AlreadyInGame,

    #[error("not in game or matchmaking queue")]
    NotQueued,

    #[error("no online game found")]
    NoOnlineGame,

    #[error("no active connection")]
    NoConnection,

    #[error("no user with id {0}")]
    UserNotFound(String),

    #[error("chess game is still in progress")]
    GameStillActive,
}

impl UsersError {
    pub fn code(&self) -> u8 {
        match self {
            UsersError::AlreadyQueued => 1,
            UsersError::AlreadyInGame => 2,
            UsersError::NotQueued => 3,
            UsersError::NoOnlineGame => 4,
            UsersError::NoConnection => 5,
            UsersError::UserNotFound(_) => 6,
            UsersError::GameStillActive => 7,
        }
    }
}

// ---------------------------------------------------------------------------
// User records
// ---------------------------------------------------------------------------

/// Matchmaking status, serialized as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UserStatus {
    Idle = 0,
    Queued = 1,
    InGame = 2,
}

impl UserStatus {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Serialize for UserStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone)]
struct OnlineUser {
    connections: HashSet<ConnectionId>,
    username: String,
    status: UserStatus,
    game: Option<GameId>,
}

/// Public view of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub online_game_status: UserStatus,
    pub has_online_game: bool,
    pub username: String,
    pub num_connections: usize,
}

/// Result of a successful `join_matchmaking_queue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Waiting for an opponent.
    Queued,
    /// Paired; both users are now in `game_id`.
    Paired {
        game_id: GameId,
        white: UserId,
        black: UserId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub online_users: usize,
    pub queued_users: usize,
    pub active_games: usize,
    pub connections: usize,
}

// ---------------------------------------------------------------------------
// OnlineUsers
// ---------------------------------------------------------------------------

/// Owns every user record and every live [`OnlineGame`].
///
/// Invariant: at rest the queue holds at most one user, and a user is
/// `InGame` exactly when it references a game in `games`.
#[derive(Debug, Default)]
pub struct OnlineUsers {
    users: HashMap<UserId, OnlineUser>,
    games: HashMap<GameId, OnlineGame>,
    queue: VecDeque<UserId>,
}

impl OnlineUsers {
    pub fn new() -> Self {
        Self::default()
    }

    // -- connections ----------------------------------------------------

    /// Register a connection, creating the user with a random name on first
    /// sight.
    pub fn add_user_connection(&mut self, user: &str, conn: ConnectionId) {
        let record = self.users.entry(user.to_string()).or_insert_with(|| {
            let username = random_name();
            info!(user, %username, "new online user");
            OnlineUser {
                connections: HashSet::new(),
                username,
                status: UserStatus::Idle,
                game: None,
            }
        });
        record.connections.insert(conn);
    }

    /// Drop a connection. A queued user left without connections is
    /// removed from the queue.
    pub fn remove_user_connection(
        &mut self,
        user: &str,
        conn: ConnectionId,
    ) -> Result<(), UsersError> {
        let record = self.user_mut(user)?;
        record.connections.remove(&conn);
        if record.connections.is_empty() && record.status == UserStatus::Queued {
            debug!(user, "last connection closed; leaving queue");
            self.leave_matchmaking_queue(user)?;
        }
        Ok(())
    }

    pub fn generate_new_random_name(&mut self, user: &str) -> Result<String, UsersError> {
        let record = self.user_mut(user)?;
        record.username = random_name();
        Ok(record.username.clone())
    }

    // -- matchmaking ----------------------------------------------------

    pub fn join_matchmaking_queue(&mut self, user: &str) -> Result<JoinOutcome, UsersError> {
        let record = self.user_mut(user)?;
        if record.connections.is_empty() {
            return Err(UsersError::NoConnection);
        }
        match record.status {
            UserStatus::InGame => return Err(UsersError::AlreadyInGame),
            UserStatus::Queued => return Err(UsersError::AlreadyQueued),
            UserStatus::Idle => record.status = UserStatus::Queued,
        }
        self.queue.push_back(user.to_string());

        assert!(self.queue.len() <= 2, "matchmaking queue exceeded length of 2");
        if self.queue.len() < 2 {
            debug!(user, "queued for matchmaking");
            return Ok(JoinOutcome::Queued);
        }

        let (Some(first), Some(second)) = (self.queue.pop_front(), self.queue.pop_front()) else {
            unreachable!("queue holds two users");
        };
        let game = OnlineGame::new(first.clone(), second.clone());
        let game_id = game.game_id();
        let players = game.users();
        for id in [&first, &second] {
            let record = self.user_mut(id)?;
            record.status = UserStatus::InGame;
            record.game = Some(game_id);
        }
        self.games.insert(game_id, game);
        info!(%game_id, white = %players.white, black = %players.black, "paired players");
        Ok(JoinOutcome::Paired {
            game_id,
            white: players.white,
            black: players.black,
        })
    }

    pub fn leave_matchmaking_queue(&mut self, user: &str) -> Result<(), UsersError> {
        let status = self.user(user)?.status;
        match status {
            UserStatus::InGame => Err(UsersError::AlreadyInGame),
            UserStatus::Idle => Err(UsersError::NotQueued),
            UserStatus::Queued => {
                assert!(
                    self.queue.len() == 1 && self.queue[0] == user,
                    "queued user {user} is not alone in the matchmaking queue"
                );
                self.queue.clear();
                self.user_mut(user)?.status = UserStatus::Idle;
                debug!(user, "left matchmaking queue");
                Ok(())
            }
        }
    }

    /// Release a finished game: both players return to idle and the game is
    /// dropped from the registry and handed back.
    pub fn chess_game_has_concluded(&mut self, game_id: GameId) -> Result<OnlineGame, UsersError> {
        let game = self.games.get(&game_id).ok_or(UsersError::NoOnlineGame)?;
        if game.is_active_game() {
            return Err(UsersError::GameStillActive);
        }
        let players = game.users();
        for id in [&players.white, &players.black] {
            if let Some(record) = self.users.get_mut(id) {
                record.status = UserStatus::Idle;
                record.game = None;
            }
        }
        let game = self.games.remove(&game_id).ok_or(UsersError::NoOnlineGame)?;
        info!(%game_id, status = %game.status(), "game concluded");
        Ok(game)
    }

    // -- queries --------------------------------------------------------

    pub fn online_game_status(&self, user: &str) -> Result<UserStatus, UsersError> {
        Ok(self.user(user)?.status)
    }

    pub fn online_user_state(&self, user: &str) -> Result<UserState, UsersError> {
        let record = self.user(user)?;
        Ok(UserState {
            online_game_status: record.status,
            has_online_game: record.game.is_some(),
            username: record.username.clone(),
            num_connections: record.connections.len(),
        })
    }

    pub fn username(&self, user: &str) -> Result<&str, UsersError> {
        Ok(&self.user(user)?.username)
    }

    pub fn online_game(&self, user: &str) -> Result<&OnlineGame, UsersError> {
        let game_id = self.user(user)?.game.ok_or(UsersError::NoOnlineGame)?;
        self.games.get(&game_id).ok_or(UsersError::NoOnlineGame)
    }

    pub fn online_game_mut(&mut self, user: &str) -> Result<&mut OnlineGame, UsersError> {
        let game_id = self.user(user)?.game.ok_or(UsersError::NoOnlineGame)?;
        self.games.get_mut(&game_id).ok_or(UsersError::NoOnlineGame)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            online_users: self
                .users
                .values()
                .filter(|u| !u.connections.is_empty())
                .count(),
            queued_users: self.queue.len(),
            active_games: self.games.len(),
            connections: self.users.values().map(|u| u.connections.len()).sum(),
        }
    }

    fn user(&self, user: &str) -> Result<&OnlineUser, UsersError> {
        self.users
            .get(user)
            .ok_or_else(|| UsersError::UserNotFound(user.to_string()))
    }

    fn user_mut(&mut self, user: &str) -> Result<&mut OnlineUser, UsersError> {
        self.users
            .get_mut(user)
            .ok_or_else(|| UsersError::UserNotFound(user.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
