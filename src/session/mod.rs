//! Caller identity.
//!
//! [`RequestIdentity`] is passed explicitly into every repository call. The
//! middleware builds it from the login session and the request path; the
//! invitation service builds it from the redeemer's session and the share
//! code's LPA.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::repository::{Error, Result};

mod store;

pub use store::{MemorySessionStore, OneLoginState, SessionError, SessionStore};

/// Who is calling, and for which LPA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub session_id: String,
    pub lpa_id: String,
    pub organisation_id: String,
    pub email: String,
}

impl RequestIdentity {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_lpa(mut self, lpa_id: impl Into<String>) -> Self {
        self.lpa_id = lpa_id.into();
        self
    }

    pub fn with_organisation(mut self, organisation_id: impl Into<String>) -> Self {
        self.organisation_id = organisation_id.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Refine this identity with the non-empty fields of `inner`.
    ///
    /// Fields an outer layer already resolved survive unless the inner layer
    /// supplies a value of its own.
    pub fn merge(&self, inner: &RequestIdentity) -> Self {
        fn pick(outer: &str, inner: &str) -> String {
            let chosen = if inner.is_empty() { outer } else { inner };
            chosen.to_string()
        }

        Self {
            session_id: pick(&self.session_id, &inner.session_id),
            lpa_id: pick(&self.lpa_id, &inner.lpa_id),
            organisation_id: pick(&self.organisation_id, &inner.organisation_id),
            email: pick(&self.email, &inner.email),
        }
    }

    pub fn is_organisation(&self) -> bool {
        !self.organisation_id.is_empty()
    }

    pub(crate) fn session(&self) -> Result<&str> {
        if self.session_id.is_empty() {
            return Err(Error::SessionMissing);
        }
        Ok(&self.session_id)
    }

    /// The LPA id alone. An identity with nothing resolved at all means no
    /// session reached the caller.
    pub(crate) fn lpa(&self, operation: &'static str) -> Result<&str> {
        if *self == RequestIdentity::default() {
            return Err(Error::SessionMissing);
        }
        if self.lpa_id.is_empty() {
            return Err(Error::MissingSessionData {
                operation,
                required: "lpa_id",
            });
        }
        Ok(&self.lpa_id)
    }

    /// Both ids, or the error describing which is absent.
    pub(crate) fn lpa_and_session(&self, operation: &'static str) -> Result<(&str, &str)> {
        let session_id = self.session()?;
        if self.lpa_id.is_empty() {
            return Err(Error::MissingSessionData {
                operation,
                required: "lpa_id and session_id",
            });
        }
        Ok((&self.lpa_id, session_id))
    }

    pub(crate) fn organisation(&self, operation: &'static str) -> Result<&str> {
        self.session()?;
        if self.organisation_id.is_empty() {
            return Err(Error::MissingSessionData {
                operation,
                required: "organisation_id",
            });
        }
        Ok(&self.organisation_id)
    }
}

/// An authenticated login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    /// Subject identifier from the identity provider.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub organisation_id: String,
}

impl LoginSession {
    /// Session id used in keys: the base64 of the subject.
    pub fn session_id(&self) -> String {
        STANDARD.encode(&self.sub)
    }

    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            session_id: self.session_id(),
            lpa_id: String::new(),
            organisation_id: self.organisation_id.clone(),
            email: self.email.clone(),
        }
    }
}
