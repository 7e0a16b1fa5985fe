//! Connection hub: tracks every open socket per user and delivers events to
//! all of a user's connections.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::ServerEvent;
use crate::session::ConnectionId;

/// Sending half of one socket's outbound queue. The handler owns the
/// receiving half.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// An event addressed to every connection of one user.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: String,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn new(to: impl Into<String>, event: ServerEvent) -> Self {
        Outbound {
            to: to.into(),
            event,
        }
    }
}

#[derive(Debug)]
pub struct Hub {
    /// user id → { connection id → sender }
    conns: RwLock<HashMap<String, HashMap<ConnectionId, EventSender>>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a connection for `user`, returning its id and event receiver.
    pub async fn connect(&self, user: &str) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut conns = self.conns.write().await;
        conns.entry(user.to_string()).or_default().insert(id, tx);

        debug!(user, conn = id, "WS client connected");
        (id, rx)
    }

    pub async fn disconnect(&self, user: &str, conn: ConnectionId) {
        let mut conns = self.conns.write().await;
        if let Some(user_conns) = conns.get_mut(user) {
            user_conns.remove(&conn);
            if user_conns.is_empty() {
                conns.remove(user);
            }
        }
        debug!(user, conn, "WS client disconnected");
    }

    /// Queue `event` on every connection of `user`. Events queued for one
    /// connection are written in order.
    pub async fn send_to_user(&self, user: &str, event: ServerEvent) {
        let conns = self.conns.read().await;
        let Some(user_conns) = conns.get(user) else {
            debug!(user, "no open connection; event dropped");
            return;
        };
        let stale: Vec<ConnectionId> = user_conns
            .iter()
            .filter(|(_, tx)| tx.send(event.clone()).is_err())
            .map(|(&id, _)| id)
            .collect();
        drop(conns); // release read lock before write

        if !stale.is_empty() {
            self.remove_stale(user, &stale).await;
        }
    }

    /// Queue `event` on a single connection.
    pub async fn send_to_connection(&self, user: &str, conn: ConnectionId, event: ServerEvent) {
        let conns = self.conns.read().await;
        let sent = conns
            .get(user)
            .and_then(|c| c.get(&conn))
            .is_some_and(|tx| tx.send(event).is_ok());
        drop(conns);

        if !sent {
            self.remove_stale(user, &[conn]).await;
        }
    }

    /// Deliver a batch in order.
    pub async fn deliver(&self, batch: Vec<Outbound>) {
        for Outbound { to, event } in batch {
            self.send_to_user(&to, event).await;
        }
    }

    async fn remove_stale(&self, user: &str, stale: &[ConnectionId]) {
        let mut conns = self.conns.write().await;
        if let Some(user_conns) = conns.get_mut(user) {
            for conn in stale {
                if user_conns.remove(conn).is_some() {
                    warn!(user, conn, "removed stale WS client");
                }
            }
            if user_conns.is_empty() {
                conns.remove(user);
            }
        }
    }

    pub async fn connection_count(&self, user: &str) -> usize {
        let conns = self.conns.read().await;
        conns.get(user).map_or(0, |c| c.len())
    }

    /// Total number of open connections across all users.
    pub async fn total_connections(&self) -> usize {
        let conns = self.conns.read().await;
        conns.values().map(|c| c.len()).sum()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self {
            conns: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
