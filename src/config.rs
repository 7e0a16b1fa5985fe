/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Request header carrying the user id set by the auth layer in front of
    /// this service.
    pub user_id_header: String,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8082),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            user_id_header: std::env::var("CHESS_USER_ID_HEADER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.to_ascii_lowercase())
                .unwrap_or_else(|| "x-user-id".to_string()),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            user_id_header: "x-user-id".to_string(),
        }
    }
}
