use axum::Json;
use axum::extract::{Path, State};

use crate::session::UserState;

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
    })
}

// =========================================================================
// Registry
// =========================================================================

/// GET /api/stats
pub async fn stats(State(state): State<SharedState>) -> Json<StatsResponse> {
    let registry = state.users.lock().await.stats();
    let connections = state.hub.total_connections().await;
    Json(StatsResponse {
        online_users: registry.online_users,
        queued_users: registry.queued_users,
        active_games: registry.active_games,
        connections,
    })
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<UserState>, ApiError> {
    let users = state.users.lock().await;
    Ok(Json(users.online_user_state(&id)?))
}

// =========================================================================
// Tests
// =========================================================================
