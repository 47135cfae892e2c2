//! Client configuration.

/// Default backend base URL, matching the development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "CHARLA_BACKEND_URL";

/// Configuration for the chat client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the chat backend
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Create a Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration, honoring the `CHARLA_BACKEND_URL` override.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        config
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}
