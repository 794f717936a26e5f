//! Login through the identity provider, and sign-out.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{info, warn};

use super::{cookie, set_cookie, AppState, HandlerResult, ONE_LOGIN_COOKIE, SESSION_COOKIE};
use crate::session::{LoginSession, OneLoginState, RequestIdentity};
use crate::utils::random;

/// Lifetime of the cookie tying a login callback to its start.
const ONE_LOGIN_MAX_AGE: i64 = 600;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    pub redirect: String,
    pub locale: String,
}

/// Only same-site paths may be used as post-login destinations.
fn safe_redirect(redirect: &str) -> String {
    if redirect.starts_with('/') && !redirect.starts_with("//") {
        redirect.to_string()
    } else {
        "/dashboard".to_string()
    }
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> HandlerResult {
    let locale = if query.locale.is_empty() {
        "en".to_string()
    } else {
        query.locale
    };
    let params = OneLoginState {
        state: random::token(16),
        nonce: random::token(16),
        locale,
        redirect: safe_redirect(&query.redirect),
    };

    let url = state
        .identity
        .auth_code_url(&params.state, &params.nonce, &params.locale)?;
    let token = state.sessions.set_one_login_state(params).await?;

    Ok((
        AppendHeaders([set_cookie(ONE_LOGIN_COOKIE, &token, ONE_LOGIN_MAX_AGE)]),
        Redirect::to(&url),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

pub async fn login_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> HandlerResult {
    let Some(params) = one_login_state(&state, &headers).await else {
        warn!("Login callback without a login in progress");
        return Ok(Redirect::to("/start").into_response());
    };
    if params.state != query.state {
        warn!("Login callback state mismatch");
        return Ok(Redirect::to("/start").into_response());
    }

    let tokens = state.identity.exchange(&query.code, &params.nonce).await?;
    let user = state.identity.user_info(&tokens.access_token).await?;

    let mut login = LoginSession {
        sub: user.sub,
        email: user.email,
        organisation_id: String::new(),
    };
    match state
        .repositories
        .organisations
        .member_for_session(&RequestIdentity::new(login.session_id()))
        .await
    {
        Ok(member) => login.organisation_id = member.organisation_id,
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let session_id = login.session_id();
    let token = state.sessions.set_login(login).await?;
    info!(session_id = %session_id, "Logged in");

    Ok((
        AppendHeaders([
            set_cookie(SESSION_COOKIE, &token, state.session_max_age_seconds),
            set_cookie(ONE_LOGIN_COOKIE, "", 0),
        ]),
        Redirect::to(&params.redirect),
    )
        .into_response())
}

async fn one_login_state(state: &AppState, headers: &HeaderMap) -> Option<OneLoginState> {
    let token = cookie(headers, ONE_LOGIN_COOKIE)?;
    state.sessions.one_login_state(&token).await.ok()
}

pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult<Response> {
    if let Some(token) = cookie(&headers, SESSION_COOKIE) {
        state.sessions.clear_login(&token).await?;
    }

    Ok((
        AppendHeaders([set_cookie(SESSION_COOKIE, "", 0)]),
        Redirect::to("/start"),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(
            safe_redirect("/attorney/enter-reference-number"),
            "/attorney/enter-reference-number"
        );
        assert_eq!(safe_redirect("https://elsewhere.example"), "/dashboard");
        assert_eq!(safe_redirect("//elsewhere.example"), "/dashboard");
        assert_eq!(safe_redirect(""), "/dashboard");
    }
}
