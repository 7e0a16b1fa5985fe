pub mod names;
pub mod online_game;
pub mod online_users;

pub use online_game::{
    DrawState, GameId, GameUsers, MoveInfo, NoChangeReason, OnlineGame, PlayerDrawState,
    PlayerGameState, UserId, VersionInfo,
};
pub use online_users::{
    ConnectionId, JoinOutcome, OnlineUsers, RegistryStats, UserState, UserStatus, UsersError,
};
