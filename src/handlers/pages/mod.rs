//! Page handlers for each actor, plus the unauthenticated start pages.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::actor::{ActorKind, ActorType};
use crate::task::TaskError;

pub mod attorney;
pub mod certificate_provider;
pub mod donor;
pub mod supporter;

/// Where a task-list page for `actor_type` lives.
pub fn task_list_path(actor_type: ActorType, lpa_id: &str) -> String {
    match actor_type.kind() {
        ActorKind::Attorney => format!("/attorney/{lpa_id}/task-list"),
        ActorKind::CertificateProvider => {
            format!("/certificate-provider/{lpa_id}/task-list")
        }
        ActorKind::Donor => format!("/lpa/{lpa_id}/task-list"),
        ActorKind::Supporter => format!("/supporter/{lpa_id}/view-lpa"),
    }
}

/// A task that may not run yet sends the caller back to their task list.
fn not_ready(error: TaskError, back: &str) -> Response {
    warn!(error = %error, "Task not ready");
    Redirect::to(back).into_response()
}

/// First page after logging in from a role's start page.
fn after_login(actor_type: ActorType) -> &'static str {
    match actor_type.kind() {
        ActorKind::Attorney => "/attorney/enter-reference-number",
        ActorKind::CertificateProvider => "/certificate-provider/enter-reference-number",
        ActorKind::Supporter => "/supporter/dashboard",
        ActorKind::Donor => "/dashboard",
    }
}

fn start(state: &AppState, actor_type: ActorType) -> Response {
    state.renderer.render(
        "start",
        json!({
            "actor_type": actor_type,
            "login": format!("/login?redirect={}", after_login(actor_type)),
        }),
    )
}

pub async fn donor_start(State(state): State<AppState>) -> Response {
    start(&state, ActorType::Donor)
}

pub async fn attorney_start(State(state): State<AppState>) -> Response {
    start(&state, ActorType::Attorney)
}

pub async fn certificate_provider_start(State(state): State<AppState>) -> Response {
    start(&state, ActorType::CertificateProvider)
}

pub async fn supporter_start(State(state): State<AppState>) -> Response {
    start(&state, ActorType::Supporter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list_path() {
        assert_eq!(
            task_list_path(ActorType::ReplacementTrustCorporation, "1"),
            "/attorney/1/task-list"
        );
        assert_eq!(
            task_list_path(ActorType::CertificateProvider, "1"),
            "/certificate-provider/1/task-list"
        );
        assert_eq!(task_list_path(ActorType::Donor, "1"), "/lpa/1/task-list");
    }
}
