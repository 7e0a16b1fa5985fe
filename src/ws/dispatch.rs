//! Turns one inbound command into registry calls and the events they
//! produce.
//!
//! Every function here is synchronous and runs to completion against a
//! borrowed [`OnlineUsers`]; the caller holds the registry lock for the
//! duration and delivers the returned batch before releasing it.

use tracing::{debug, info, warn};

use super::hub::Outbound;
use super::messages::{ClientCommand, Failure, FullGameState, PlayerName, PlayerNames, ServerEvent};
use crate::session::{
    GameId, JoinOutcome, MoveInfo, NoChangeReason, OnlineGame, OnlineUsers, UsersError,
};

/// Handle one command from `user`.
pub fn handle(users: &mut OnlineUsers, user: &str, cmd: ClientCommand) -> Vec<Outbound> {
    debug!(user, ?cmd, "dispatching command");
    match cmd {
        ClientCommand::JoinQueue => join_queue(users, user),
        ClientCommand::LeaveQueue => leave_queue(users, user),

        ClientCommand::PlayMove {
            move_info,
            game_state_version,
        } => play_move(users, user, move_info.as_ref(), game_state_version),
        ClientCommand::OfferDraw { draw_state_version } => {
            draw_action(users, user, draw_state_version, OnlineGame::player_offers_draw)
        }
        ClientCommand::ResetDrawOffers { draw_state_version } => draw_action(
            users,
            user,
            draw_state_version,
            OnlineGame::player_resets_draw_agreement,
        ),
        ClientCommand::NoDrawOffers { draw_state_version } => draw_action(
            users,
            user,
            draw_state_version,
            OnlineGame::player_does_not_want_draw_offers,
        ),
        ClientCommand::WantDrawOffers { draw_state_version } => draw_action(
            users,
            user,
            draw_state_version,
            OnlineGame::player_wants_draw_offers,
        ),
        ClientCommand::Resign => terminate(users, user, OnlineGame::player_resigns),

        ClientCommand::RecoverState => with_game(users, user, |users, game| {
            ServerEvent::CurrentState(full_state(users, game, user))
        }),
        ClientCommand::RecoverGameState => with_game(users, user, |_, game| {
            ServerEvent::CurrentGameState {
                game_state: game.current_game_state(user),
            }
        }),
        ClientCommand::RecoverDrawState => with_game(users, user, |_, game| {
            ServerEvent::CurrentDrawState {
                draw_state: game.current_draw_state(),
            }
        }),
        ClientCommand::GetVersionInfo => with_game(users, user, |_, game| {
            ServerEvent::CurrentVersionInfo {
                version_info: game.version_info(),
            }
        }),

        ClientCommand::GetUserState => {
            user_reply(user, users.online_user_state(user).map(ServerEvent::UserCurrentState))
        }
        ClientCommand::GetGameStatus => user_reply(
            user,
            users
                .online_game_status(user)
                .map(ServerEvent::UserCurrentGameStatus),
        ),
        ClientCommand::GetNewName => user_reply(
            user,
            users
                .generate_new_random_name(user)
                .map(ServerEvent::UserNewName),
        ),
    }
}

/// The external session timer reports that `user` ran out of time.
pub fn player_timeout(users: &mut OnlineUsers, user: &str) -> Vec<Outbound> {
    terminate(users, user, OnlineGame::player_timeout)
}

/// The connection-loss collaborator reports that `user` left their game.
pub fn player_abandons(users: &mut OnlineUsers, user: &str) -> Vec<Outbound> {
    terminate(users, user, OnlineGame::player_abandons)
}

// ---------------------------------------------------------------------------
// Matchmaking
// ---------------------------------------------------------------------------

fn join_queue(users: &mut OnlineUsers, user: &str) -> Vec<Outbound> {
    match users.join_matchmaking_queue(user) {
        Ok(JoinOutcome::Queued) => vec![Outbound::new(user, ServerEvent::QueueJoined)],
        Ok(JoinOutcome::Paired {
            game_id,
            white,
            black,
        }) => {
            let Ok(game) = users.online_game(&white) else {
                warn!(%game_id, "paired game missing from registry");
                return Vec::new();
            };
            [white.as_str(), black.as_str()]
                .into_iter()
                .map(|player| {
                    Outbound::new(player, ServerEvent::GameJoined(full_state(users, game, player)))
                })
                .collect()
        }
        Err(err) => vec![Outbound::new(user, ServerEvent::QueueFailure((&err).into()))],
    }
}

fn leave_queue(users: &mut OnlineUsers, user: &str) -> Vec<Outbound> {
    let event = match users.leave_matchmaking_queue(user) {
        Ok(()) => ServerEvent::QueueLeft,
        Err(err) => ServerEvent::QueueFailure((&err).into()),
    };
    vec![Outbound::new(user, event)]
}

// ---------------------------------------------------------------------------
// Game actions
// ---------------------------------------------------------------------------

fn play_move(
    users: &mut OnlineUsers,
    user: &str,
    mv: Option<&MoveInfo>,
    game_state_version: u64,
) -> Vec<Outbound> {
    let game = match users.online_game_mut(user) {
        Ok(game) => game,
        Err(err) => return game_not_found(user, &err),
    };
    match game.play_move(user, mv, game_state_version) {
        Ok(()) => settle(users, user),
        Err(_) if !game.is_active_game() => vec![Outbound::new(user, ServerEvent::GameFinished)],
        Err(NoChangeReason::GameStateVersionMismatch) => {
            vec![Outbound::new(user, ServerEvent::GameStateOutOfSync)]
        }
        Err(reason) => {
            debug!(user, %reason, "move rejected");
            vec![Outbound::new(
                user,
                ServerEvent::MoveFailure {
                    code: reason.code(),
                },
            )]
        }
    }
}

fn draw_action(
    users: &mut OnlineUsers,
    user: &str,
    draw_state_version: u64,
    action: fn(&mut OnlineGame, &str, u64) -> Result<(), NoChangeReason>,
) -> Vec<Outbound> {
    let game = match users.online_game_mut(user) {
        Ok(game) => game,
        Err(err) => return game_not_found(user, &err),
    };
    if !game.is_active_game() {
        return vec![Outbound::new(user, ServerEvent::GameFinished)];
    }

    let before = game.current_draw_state().version;
    match action(game, user, draw_state_version) {
        Ok(()) => settle(users, user),
        Err(_) if game.current_draw_state().version != before => {
            let draw_state = game.current_draw_state();
            let players = game.users();
            [players.white, players.black]
                .into_iter()
                .map(|player| Outbound::new(player, ServerEvent::DrawStateUpdate(draw_state)))
                .collect()
        }
        Err(NoChangeReason::DrawStateVersionMismatch) => {
            vec![Outbound::new(user, ServerEvent::DrawStateOutOfSync)]
        }
        Err(_) => vec![Outbound::new(user, ServerEvent::NoDrawStateChange)],
    }
}

/// Resignation, timeout, abandonment: unversioned game-ending actions.
fn terminate(
    users: &mut OnlineUsers,
    user: &str,
    action: fn(&mut OnlineGame, &str) -> Result<(), NoChangeReason>,
) -> Vec<Outbound> {
    let game = match users.online_game_mut(user) {
        Ok(game) => game,
        Err(err) => return game_not_found(user, &err),
    };
    match action(game, user) {
        Ok(()) => settle(users, user),
        Err(_) => vec![Outbound::new(user, ServerEvent::GameFinished)],
    }
}

/// After an accepted change: push the new state to both players, and
/// release the game if it just ended.
fn settle(users: &mut OnlineUsers, user: &str) -> Vec<Outbound> {
    let Ok(game) = users.online_game(user) else {
        return Vec::new();
    };
    let players = game.users();
    let out: Vec<Outbound> = [&players.white, &players.black]
        .into_iter()
        .map(|player| {
            Outbound::new(
                player.as_str(),
                ServerEvent::GameStateUpdate(game.current_game_state(player)),
            )
        })
        .collect();
    if !game.is_active_game() {
        let game_id = game.game_id();
        conclude(users, game_id);
    }
    out
}

fn conclude(users: &mut OnlineUsers, game_id: GameId) {
    match users.chess_game_has_concluded(game_id) {
        Ok(game) => info!(%game_id, status = game.status().code(), "released finished game"),
        Err(err) => warn!(%game_id, %err, "could not release game"),
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn with_game(
    users: &OnlineUsers,
    user: &str,
    reply: impl FnOnce(&OnlineUsers, &OnlineGame) -> ServerEvent,
) -> Vec<Outbound> {
    match users.online_game(user) {
        Ok(game) => vec![Outbound::new(user, reply(users, game))],
        Err(err) => game_not_found(user, &err),
    }
}

fn full_state(users: &OnlineUsers, game: &OnlineGame, user: &str) -> FullGameState {
    let players = game.users();
    let name = |id: &str| PlayerName {
        username: users.username(id).unwrap_or_default().to_string(),
    };
    FullGameState {
        game_state: game.current_game_state(user),
        draw_state: game.current_draw_state(),
        user_state: PlayerNames {
            white: name(&players.white),
            black: name(&players.black),
        },
    }
}

fn user_reply(user: &str, result: Result<ServerEvent, UsersError>) -> Vec<Outbound> {
    let event = result.unwrap_or_else(|err| ServerEvent::UserNotFound(Failure::from(&err)));
    vec![Outbound::new(user, event)]
}

fn game_not_found(user: &str, err: &UsersError) -> Vec<Outbound> {
    vec![Outbound::new(user, ServerEvent::GameNotFound(err.into()))]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
