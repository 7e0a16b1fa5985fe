use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::session::OnlineUsers;
use crate::ws::Hub;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    /// Every registry mutation happens under this lock, one command at a time.
    pub users: Mutex<OnlineUsers>,
    pub hub: Arc<Hub>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(AppState {
            users: Mutex::new(OnlineUsers::new()),
            hub: Hub::new(),
            config,
            start_time: std::time::Instant::now(),
        })
    }
}
