//! Login session storage behind the session cookie.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::LoginSession;
use crate::utils::clock::{system_now, Now};
use crate::utils::random;

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session missing or expired")]
    Missing,

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Parameters carried between starting a login and its callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneLoginState {
    pub state: String,
    pub nonce: String,
    pub locale: String,
    /// Path to land on after login completes.
    pub redirect: String,
}

/// Storage for login sessions, addressed by the opaque cookie token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a token to its login. Fails with `Missing` when unknown or expired.
    async fn login(&self, token: &str) -> Result<LoginSession, SessionError>;

    /// Store a login and return its token.
    async fn set_login(&self, session: LoginSession) -> Result<String, SessionError>;

    async fn clear_login(&self, token: &str) -> Result<(), SessionError>;

    async fn one_login_state(&self, token: &str) -> Result<OneLoginState, SessionError>;

    async fn set_one_login_state(&self, state: OneLoginState) -> Result<String, SessionError>;
}

struct Entry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// In-memory session store for single-instance deployments and tests.
pub struct MemorySessionStore {
    logins: RwLock<HashMap<String, Entry<LoginSession>>>,
    states: RwLock<HashMap<String, Entry<OneLoginState>>>,
    ttl: Duration,
    now: Now,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, system_now())
    }

    pub fn with_clock(ttl: Duration, now: Now) -> Self {
        Self {
            logins: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
            ttl,
            now,
        }
    }

    fn live<T: Clone>(&self, entries: &HashMap<String, Entry<T>>, token: &str) -> Result<T, SessionError> {
        entries
            .get(token)
            .filter(|entry| entry.expires_at > (self.now)())
            .map(|entry| entry.value.clone())
            .ok_or(SessionError::Missing)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(2))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn login(&self, token: &str) -> Result<LoginSession, SessionError> {
        let logins = self.logins.read().await;
        self.live(&logins, token)
    }

    async fn set_login(&self, session: LoginSession) -> Result<String, SessionError> {
        let token = random::token(TOKEN_LENGTH);
        let entry = Entry {
            value: session,
            expires_at: (self.now)() + self.ttl,
        };

        let mut logins = self.logins.write().await;
        let now = (self.now)();
        logins.retain(|_, entry| entry.expires_at > now);
        logins.insert(token.clone(), entry);
        Ok(token)
    }

    async fn clear_login(&self, token: &str) -> Result<(), SessionError> {
        self.logins.write().await.remove(token);
        Ok(())
    }

    async fn one_login_state(&self, token: &str) -> Result<OneLoginState, SessionError> {
        let states = self.states.read().await;
        self.live(&states, token)
    }

    async fn set_one_login_state(&self, state: OneLoginState) -> Result<String, SessionError> {
        let token = random::token(TOKEN_LENGTH);
        let entry = Entry {
            value: state,
            expires_at: (self.now)() + self.ttl,
        };
        self.states.write().await.insert(token.clone(), entry);
        Ok(token)
    }
}
