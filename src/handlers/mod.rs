//! HTTP surface: router, session resolution and page handlers.
//!
//! Handlers are thin. They pull the caller's identity and actor record out
//! of request extensions (put there by [`middleware`]), call repositories or
//! the invitation service, and hand a view model to the [`Renderer`].

use std::sync::Arc;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::clients::{
    ClientError, HttpNotifyClient, IdentityProvider, LogNotifyClient, MockIdentityProvider,
    NotifyClient, OidcClient,
};
use crate::config::Config;
use crate::repository::{self, Repositories};
use crate::services::{InvitationError, InvitationService};
use crate::session::{MemorySessionStore, SessionError, SessionStore};
use crate::storage::RecordStore;
use crate::task::TaskError;
use crate::utils::clock::{system_now, Now};

pub mod auth;
pub mod dashboard;
pub mod middleware;
pub mod pages;
pub mod reference;
pub mod render;
pub mod router;

pub use render::{JsonRenderer, Renderer};
pub use router::{router, serve};

/// Cookie holding the login session token.
pub const SESSION_COOKIE: &str = "session";
/// Cookie holding the token of an in-flight login.
pub const ONE_LOGIN_COOKIE: &str = "params";

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub invitations: Arc<InvitationService>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub renderer: Arc<dyn Renderer>,
    /// Lifetime of the session cookie, matching the session store's TTL.
    pub session_max_age_seconds: i64,
    /// Time source for signatures and certificates.
    pub now: Now,
}

impl AppState {
    /// Wire every collaborator from configuration around an open record store.
    ///
    /// Without an identity issuer every login is a fixed local user; with
    /// notifications disabled emails are only logged.
    pub fn from_config(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self, ClientError> {
        let now = system_now();
        let repositories = Repositories::new(store, now.clone());

        let identity: Arc<dyn IdentityProvider> = if config.identity.issuer.is_empty() {
            info!("Identity provider: local mock user");
            Arc::new(MockIdentityProvider::new("local-user", "local@example.com"))
        } else {
            info!(issuer = %config.identity.issuer, "Identity provider: OpenID Connect");
            Arc::new(OidcClient::new(
                &config.identity.issuer,
                &config.identity.client_id,
                &config.identity.client_secret,
                &config.identity.redirect_url,
            )?)
        };

        let notify: Arc<dyn NotifyClient> = if config.notify.enabled {
            Arc::new(HttpNotifyClient::new(
                &config.notify.base_url,
                &config.notify.api_key,
                config.notify.templates.clone(),
            )?)
        } else {
            info!("Notifications disabled, emails are logged only");
            Arc::new(LogNotifyClient)
        };

        let invitations = InvitationService::new(
            repositories.clone(),
            notify,
            &config.server.app_public_url,
        );
        let ttl = chrono::Duration::minutes(config.server.session_ttl_minutes);

        Ok(Self {
            repositories,
            invitations: Arc::new(invitations),
            sessions: Arc::new(MemorySessionStore::new(ttl)),
            identity,
            renderer: Arc::new(JsonRenderer),
            session_max_age_seconds: ttl.num_seconds(),
            now,
        })
    }
}

/// Anything a handler cannot recover from.
///
/// Logged in full; the client only ever sees a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] repository::Error),

    #[error(transparent)]
    Invitation(#[from] InvitationError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub type HandlerResult<T = Response> = std::result::Result<T, AppError>;

/// Value of the named cookie from the request's `Cookie` headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// A `Set-Cookie` header. A zero `max_age` expires the cookie.
pub fn set_cookie(name: &str, value: &str, max_age: i64) -> (axum::http::HeaderName, HeaderValue) {
    let cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; Secure; SameSite=Lax");
    let value = HeaderValue::from_str(&cookie)
        .unwrap_or_else(|_| HeaderValue::from_static("invalid=; Max-Age=0"));
    (SET_COOKIE, value)
}
