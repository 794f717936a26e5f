//! Reference number entry: redeeming a share code, or declining with one.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use super::pages::task_list_path;
use super::{AppState, HandlerResult};
use crate::actor::ActorType;
use crate::services::InvitationError;
use crate::session::RequestIdentity;

const INCORRECT_REFERENCE_NUMBER: &str = "incorrect reference number";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceNumberForm {
    pub reference_number: String,
}

fn form(state: &AppState, page: &str, landing: ActorType, error: Option<&str>) -> Response {
    let mut model = json!({ "actor_type": landing });
    if let Some(error) = error {
        model["errors"] = json!({ "reference_number": error });
    }
    state.renderer.render(page, model)
}

async fn redeem(
    state: &AppState,
    identity: &RequestIdentity,
    landing: ActorType,
    reference: &str,
) -> HandlerResult {
    match state.invitations.redeem(identity, landing, reference).await {
        Ok(redeemed) => Ok(Redirect::to(&task_list_path(
            redeemed.actor_type,
            &redeemed.lpa_id,
        ))
        .into_response()),
        Err(InvitationError::IncorrectReferenceNumber) => Ok(form(
            state,
            "enter_reference_number",
            landing,
            Some(INCORRECT_REFERENCE_NUMBER),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn opt_out(
    state: &AppState,
    identity: &RequestIdentity,
    landing: ActorType,
    reference: &str,
) -> HandlerResult {
    match state.invitations.opt_out(identity, landing, reference).await {
        Ok(()) => Ok(state
            .renderer
            .render("opted_out", json!({ "actor_type": landing }))),
        Err(InvitationError::IncorrectReferenceNumber) => Ok(form(
            state,
            "enter_reference_number_opt_out",
            landing,
            Some(INCORRECT_REFERENCE_NUMBER),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn attorney_form(State(state): State<AppState>) -> Response {
    form(&state, "enter_reference_number", ActorType::Attorney, None)
}

pub async fn attorney_redeem(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(input): Form<ReferenceNumberForm>,
) -> HandlerResult {
    redeem(&state, &identity, ActorType::Attorney, &input.reference_number).await
}

pub async fn attorney_opt_out(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(input): Form<ReferenceNumberForm>,
) -> HandlerResult {
    opt_out(&state, &identity, ActorType::Attorney, &input.reference_number).await
}

pub async fn certificate_provider_form(State(state): State<AppState>) -> Response {
    form(
        &state,
        "enter_reference_number",
        ActorType::CertificateProvider,
        None,
    )
}

pub async fn certificate_provider_redeem(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(input): Form<ReferenceNumberForm>,
) -> HandlerResult {
    redeem(
        &state,
        &identity,
        ActorType::CertificateProvider,
        &input.reference_number,
    )
    .await
}

pub async fn certificate_provider_opt_out(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(input): Form<ReferenceNumberForm>,
) -> HandlerResult {
    opt_out(
        &state,
        &identity,
        ActorType::CertificateProvider,
        &input.reference_number,
    )
    .await
}

pub async fn donor_form(State(state): State<AppState>) -> Response {
    form(&state, "enter_access_code", ActorType::Donor, None)
}

/// A donor entering the code a supporter sent them.
pub async fn donor_redeem(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(input): Form<ReferenceNumberForm>,
) -> HandlerResult {
    redeem(&state, &identity, ActorType::Donor, &input.reference_number).await
}
