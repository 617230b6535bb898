//! Gateway configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the engine can start against a
//! local emulator with zero configuration.

use std::time::Duration;

use adega_shared::constants::DEFAULT_POLL_INTERVAL_MS;

/// Connection parameters for the managed backend.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the identity provider's REST API.
    /// Env: `ADEGA_IDENTITY_URL`
    /// Default: `https://identitytoolkit.googleapis.com`
    pub identity_url: String,

    /// Base URL of the document store's REST API.
    /// Env: `ADEGA_STORE_URL`
    /// Default: `https://diario-de-vinhos-default-rtdb.firebaseio.com`
    pub store_url: String,

    /// Project API key appended to every request.
    /// Env: `ADEGA_API_KEY`
    /// Default: empty (emulator / open rules only).
    pub api_key: String,

    /// Backend project identifier.
    /// Env: `ADEGA_PROJECT_ID`
    /// Default: `diario-de-vinhos`
    pub project_id: String,

    /// Interval between collection snapshot refreshes.
    /// Env: `ADEGA_POLL_INTERVAL_MS`
    /// Default: 2000
    pub poll_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            identity_url: "https://identitytoolkit.googleapis.com".to_string(),
            store_url: "https://diario-de-vinhos-default-rtdb.firebaseio.com".to_string(),
            api_key: String::new(),
            project_id: "diario-de-vinhos".to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ADEGA_IDENTITY_URL") {
            config.identity_url = url;
        }

        if let Ok(url) = std::env::var("ADEGA_STORE_URL") {
            config.store_url = url;
        }

        if let Ok(key) = std::env::var("ADEGA_API_KEY") {
            config.api_key = key;
        }

        if let Ok(id) = std::env::var("ADEGA_PROJECT_ID") {
            config.project_id = id;
        }

        if let Ok(val) = std::env::var("ADEGA_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.poll_interval = Duration::from_millis(ms);
            } else {
                tracing::warn!(value = %val, "Invalid ADEGA_POLL_INTERVAL_MS, using default");
            }
        }

        config
    }
}
