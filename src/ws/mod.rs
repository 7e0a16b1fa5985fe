//! WebSocket module: live matchmaking and game sessions.
//!
//! - [`messages`]: Typed command/event envelopes.
//! - [`hub`]: Per-user connection tracking and delivery.
//! - [`dispatch`]: Command handling against the user registry.
//! - [`handler`]: Axum WebSocket upgrade handler.

pub mod dispatch;
pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::ws_handler;
pub use hub::{Hub, Outbound};
pub use messages::{ClientCommand, ServerEvent};
