//! Session resolution.
//!
//! Each actor kind gets a middleware that authenticates the caller from the
//! session cookie, scopes the identity to the LPA in the path, loads the
//! caller's record for that LPA and attaches it to the request. Handlers
//! behind it extract the [`RequestIdentity`], the [`ActorType`] and the
//! record as `Extension`s.
//!
//! A missing or expired login sends the browser to the role's start page
//! with a 302. A login that cannot load its record is a server error.

use axum::extract::{Path, Request, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use super::{cookie, AppError, AppState, SESSION_COOKIE};
use crate::actor::ActorType;
use crate::session::RequestIdentity;

#[derive(Debug, Deserialize)]
pub struct LpaPath {
    pub lpa_id: String,
}

/// Start page for whoever is asking for `path`.
pub fn start_path_for(path: &str) -> &'static str {
    let role = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match role {
        "attorney" => ActorType::Attorney.start_path(),
        "certificate-provider" => ActorType::CertificateProvider.start_path(),
        "supporter" => ActorType::Supporter.start_path(),
        _ => ActorType::Donor.start_path(),
    }
}

fn redirect_to_start(path: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, start_path_for(path))]).into_response()
}

/// What session resolution needs from a request, copied out so nothing
/// borrows the request across an await.
struct Caller {
    token: Option<String>,
    outer: RequestIdentity,
    path: String,
}

impl Caller {
    fn of(request: &Request) -> Self {
        Self {
            token: cookie(request.headers(), SESSION_COOKIE),
            outer: request
                .extensions()
                .get::<RequestIdentity>()
                .cloned()
                .unwrap_or_default(),
            path: request.uri().path().to_owned(),
        }
    }

    fn redirect_to_start(&self) -> Response {
        redirect_to_start(&self.path)
    }
}

/// The caller's identity from the session cookie, refining any identity an
/// outer layer already attached.
async fn logged_in(state: &AppState, caller: &Caller) -> Option<RequestIdentity> {
    let token = caller.token.as_deref()?;

    match state.sessions.login(token).await {
        Ok(login) => Some(caller.outer.merge(&login.identity())),
        Err(e) => {
            debug!(error = %e, path = %caller.path, "No login for request");
            None
        }
    }
}

/// Require a login, without binding an LPA.
pub async fn login_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let Some(identity) = logged_in(&state, &caller).await else {
        return caller.redirect_to_start();
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

pub async fn attorney_session(
    State(state): State<AppState>,
    Path(LpaPath { lpa_id }): Path<LpaPath>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let Some(identity) = logged_in(&state, &caller).await else {
        return caller.redirect_to_start();
    };
    let identity = identity.with_lpa(lpa_id);

    let attorney = match state.repositories.attorneys.get(&identity).await {
        Ok(attorney) => attorney,
        Err(e) => return AppError::from(e).into_response(),
    };

    let extensions = request.extensions_mut();
    extensions.insert(attorney.actor_type());
    extensions.insert(identity);
    extensions.insert(attorney);
    next.run(request).await
}

pub async fn certificate_provider_session(
    State(state): State<AppState>,
    Path(LpaPath { lpa_id }): Path<LpaPath>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let Some(identity) = logged_in(&state, &caller).await else {
        return caller.redirect_to_start();
    };
    let identity = identity.with_lpa(lpa_id);

    let certificate_provider = match state.repositories.certificate_providers.get(&identity).await
    {
        Ok(certificate_provider) => certificate_provider,
        Err(e) => return AppError::from(e).into_response(),
    };

    let extensions = request.extensions_mut();
    extensions.insert(ActorType::CertificateProvider);
    extensions.insert(identity);
    extensions.insert(certificate_provider);
    next.run(request).await
}

/// Donors act for themselves, so any organisation on the login is dropped
/// and the LPA is read through the donor's own key.
pub async fn donor_session(
    State(state): State<AppState>,
    Path(LpaPath { lpa_id }): Path<LpaPath>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let Some(identity) = logged_in(&state, &caller).await else {
        return caller.redirect_to_start();
    };
    let identity = RequestIdentity {
        organisation_id: String::new(),
        ..identity
    }
    .with_lpa(lpa_id);

    let lpa = match state.repositories.donors.get(&identity).await {
        Ok(lpa) => lpa,
        Err(e) => return AppError::from(e).into_response(),
    };

    let extensions = request.extensions_mut();
    extensions.insert(ActorType::Donor);
    extensions.insert(identity);
    extensions.insert(lpa);
    next.run(request).await
}

/// Resolve the organisation the caller is a member of.
///
/// Callers who are not yet in an organisation go back to the supporter
/// start page.
async fn supporter_identity(state: &AppState, caller: &Caller) -> Result<RequestIdentity, Response> {
    let Some(identity) = logged_in(state, caller).await else {
        return Err(caller.redirect_to_start());
    };
    if identity.is_organisation() {
        return Ok(identity);
    }

    match state.repositories.organisations.member_for_session(&identity).await {
        Ok(member) => Ok(identity.with_organisation(member.organisation_id)),
        Err(e) if e.is_not_found() => Err(caller.redirect_to_start()),
        Err(e) => Err(AppError::from(e).into_response()),
    }
}

pub async fn supporter_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let identity = match supporter_identity(&state, &caller).await {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let organisation = match state.repositories.organisations.get(&identity).await {
        Ok(organisation) => organisation,
        Err(e) => return AppError::from(e).into_response(),
    };

    let extensions = request.extensions_mut();
    extensions.insert(ActorType::Supporter);
    extensions.insert(identity);
    extensions.insert(organisation);
    next.run(request).await
}

/// Supporter pages about one organisation LPA.
pub async fn supporter_lpa_session(
    State(state): State<AppState>,
    Path(LpaPath { lpa_id }): Path<LpaPath>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = Caller::of(&request);
    let identity = match supporter_identity(&state, &caller).await {
        Ok(identity) => identity.with_lpa(lpa_id),
        Err(response) => return response,
    };

    let lpa = match state.repositories.donors.get(&identity).await {
        Ok(lpa) => lpa,
        Err(e) => return AppError::from(e).into_response(),
    };

    let extensions = request.extensions_mut();
    extensions.insert(ActorType::Supporter);
    extensions.insert(identity);
    extensions.insert(lpa);
    next.run(request).await
}
