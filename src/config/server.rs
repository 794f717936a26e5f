//! Server and external service configuration types.

use std::collections::HashMap;

use serde::Deserialize;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    pub port: u16,
    /// Public base URL, used to build links in emails.
    pub app_public_url: String,
    /// Minutes a login session lasts.
    pub session_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5050,
            app_public_url: "http://localhost:5050".to_string(),
            session_ttl_minutes: 120,
        }
    }
}

/// OpenID Connect client settings. An empty issuer selects the mock
/// provider, for local runs only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub issuer: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Email notification settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// When false, emails are logged instead of sent.
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    /// Template name to provider template id.
    pub templates: HashMap<String, String>,
}
