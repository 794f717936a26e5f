//! External service clients.
//!
//! The identity provider and the notification sender sit behind traits so the
//! router and services can be built against mocks in tests.

pub mod identity;
pub mod notify;

pub use identity::{IdentityProvider, MockIdentityProvider, OidcClient, Tokens, UserInfo};
pub use notify::{Email, HttpNotifyClient, LogNotifyClient, MockNotifyClient, NotifyClient, SentEmail};

/// Result type for client calls.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client unavailable: {0}")]
    Unavailable(String),
}

/// Turn a non-success response into [`ClientError::Status`], keeping the
/// first part of the body for the log.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}
