//! WebSocket upgrade handler: registers the connection with the hub and the
//! user registry, then pumps frames in both directions.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::api::state::SharedState;
use crate::session::ConnectionId;

use super::dispatch;
use super::messages::{ClientCommand, ServerEvent};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub user_id: Option<String>,
}

/// GET /ws: upgrade to WebSocket for the user identified by the auth header
/// (or the `userId` query parameter).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    State(state): State<SharedState>,
) -> Response {
    let from_header = headers
        .get(state.config.user_id_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let Some(user) = from_header
        .or(params.user_id)
        .filter(|id| !id.trim().is_empty())
    else {
        return ApiError::Unauthorized("missing user id".into()).into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
        .into_response()
}

/// Core WebSocket session logic.
async fn handle_socket(socket: WebSocket, user: String, state: SharedState) {
    let (conn, mut rx) = state.hub.connect(&user).await;
    state.users.lock().await.add_user_connection(&user, conn);

    let (mut sink, mut stream) = socket.split();

    // Writer task: forward hub events → WS sink.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader task: client → server commands.
    let reader_state = state.clone();
    let reader_user = user.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, &reader_user, conn, &text).await;
                }
                Message::Close(_) => break,
                _ => {} // Binary / Ping / Pong handled by Axum
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, &user, conn).await;
}

/// Decode one frame and run it against the registry. The registry lock is
/// held until every resulting event is queued.
async fn handle_client_message(state: &SharedState, user: &str, conn: ConnectionId, text: &str) {
    let cmd = match serde_json::from_str::<ClientCommand>(text) {
        Ok(c) => c,
        Err(e) => {
            warn!(user, conn, "invalid WS command: {e}");
            state
                .hub
                .send_to_connection(user, conn, ServerEvent::error(format!("invalid command: {e}")))
                .await;
            return;
        }
    };

    let mut users = state.users.lock().await;
    let batch = dispatch::handle(&mut users, user, cmd);
    state.hub.deliver(batch).await;
}

async fn cleanup(state: &SharedState, user: &str, conn: ConnectionId) {
    state.hub.disconnect(user, conn).await;
    if let Err(e) = state.users.lock().await.remove_user_connection(user, conn) {
        warn!(user, conn, "connection cleanup failed: {e}");
    }
    debug!(user, conn, "WS session cleaned up");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
