//! Client configuration loaded from environment variables.
//!
//! All settings default to a local development backend so the client can run
//! with zero configuration.

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    /// Env: `AMITY_API_URL`
    /// Default: `http://localhost:8080/api`
    pub api_url: String,

    /// WebSocket endpoint of the realtime channel.
    /// Env: `AMITY_SOCKET_URL`
    /// Default: `ws://localhost:8080/socket`
    pub socket_url: String,

    /// Bearer token for the REST API.
    /// Env: `AMITY_TOKEN`
    /// Default: empty (anonymous; the backend will reject writes).
    pub token: String,

    /// Username of the logged-in user. Threaded explicitly into the
    /// controller, never looked up ambiently.
    /// Env: `AMITY_USERNAME`
    /// Default: empty.
    pub username: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            socket_url: "ws://localhost:8080/socket".to_string(),
            token: String::new(),
            username: String::new(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("AMITY_API_URL") {
            if !url.is_empty() {
                config.api_url = url;
            }
        }

        if let Ok(url) = std::env::var("AMITY_SOCKET_URL") {
            if !url.is_empty() {
                config.socket_url = url;
            }
        }

        if let Ok(token) = std::env::var("AMITY_TOKEN") {
            config.token = token;
        }

        if let Ok(username) = std::env::var("AMITY_USERNAME") {
            config.username = username;
        }

        if config.username.is_empty() {
            tracing::warn!("AMITY_USERNAME is not set; the backend will not attribute messages");
        }

        config
    }
}
