//! Attorney pages, behind [`attorney_session`](crate::handlers::middleware::attorney_session).

use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{not_ready, task_list_path};
use crate::actor::{ActorKind, ActorType, AttorneyProvidedDetails, TrustCorporationSignatory};
use crate::handlers::{AppState, HandlerResult};
use crate::session::RequestIdentity;
use crate::task::attorney::{self as tasks, AttorneyTask};

pub async fn task_list(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(actor_type): Extension<ActorType>,
    Extension(attorney): Extension<AttorneyProvidedDetails>,
) -> HandlerResult {
    let lpa = state.repositories.donors.get_any(&identity).await?;

    Ok(state.renderer.render(
        "attorney_task_list",
        json!({
            "lpa_id": lpa.lpa_id,
            "lpa_uid": lpa.lpa_uid,
            "actor_type": actor_type,
            "donor_full_name": lpa.donor.full_name(),
            "signed": attorney.signed(),
            "tasks": tasks::task_list(&attorney, &lpa),
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmYourDetailsForm {
    pub mobile: String,
}

pub async fn confirm_your_details(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut attorney): Extension<AttorneyProvidedDetails>,
    Form(form): Form<ConfirmYourDetailsForm>,
) -> HandlerResult {
    attorney.mobile = form.mobile;
    complete(&state, &identity, attorney, AttorneyTask::ConfirmYourDetails).await
}

pub async fn read_the_lpa(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(attorney): Extension<AttorneyProvidedDetails>,
) -> HandlerResult {
    complete(&state, &identity, attorney, AttorneyTask::ReadTheLpa).await
}

async fn complete(
    state: &AppState,
    identity: &RequestIdentity,
    mut attorney: AttorneyProvidedDetails,
    task: AttorneyTask,
) -> HandlerResult {
    let lpa = state.repositories.donors.get_any(identity).await?;
    let back = task_list_path(ActorType::Attorney, &lpa.lpa_id);

    if let Err(e) = tasks::complete(task, &mut attorney, &lpa) {
        return Ok(not_ready(e, &back));
    }
    state.repositories.attorneys.put(identity, &mut attorney).await?;

    Ok(Redirect::to(&back).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignForm {
    /// Sign as the second authorised signatory of a trust corporation.
    pub second: bool,
    pub first_names: String,
    pub last_name: String,
    pub professional_title: String,
}

pub async fn sign(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut attorney): Extension<AttorneyProvidedDetails>,
    Form(form): Form<SignForm>,
) -> HandlerResult {
    let lpa = state.repositories.donors.get_any(&identity).await?;
    let back = task_list_path(ActorType::Attorney, &lpa.lpa_id);

    let signatory = attorney.is_trust_corporation.then(|| TrustCorporationSignatory {
        first_names: form.first_names,
        last_name: form.last_name,
        professional_title: form.professional_title,
        signed_at: None,
    });

    if let Err(e) = tasks::sign(&mut attorney, &lpa, signatory, form.second, (state.now)()) {
        return Ok(not_ready(e, &back));
    }
    state.repositories.attorneys.put(&identity, &mut attorney).await?;

    info!(lpa_id = %lpa.lpa_id, actor_type = %attorney.actor_type(), "Attorney signed");
    Ok(Redirect::to(&back).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SecondSignatoryForm {
    pub yes: bool,
}

/// A trust corporation choosing whether a second signatory will sign.
pub async fn would_like_second_signatory(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut attorney): Extension<AttorneyProvidedDetails>,
    Form(form): Form<SecondSignatoryForm>,
) -> HandlerResult {
    let back = task_list_path(ActorType::Attorney, &attorney.lpa_id);

    if let Err(e) = tasks::choose_second_signatory(&mut attorney, form.yes) {
        return Ok(not_ready(e, &back));
    }
    state.repositories.attorneys.put(&identity, &mut attorney).await?;

    info!(lpa_id = %attorney.lpa_id, second = form.yes, "Trust corporation chose signatories");
    Ok(Redirect::to(&back).into_response())
}

/// Withdraw from the LPA and return to the dashboard.
pub async fn opt_out(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    state
        .invitations
        .withdraw(&identity, ActorKind::Attorney)
        .await?;
    Ok(Redirect::to("/dashboard").into_response())
}
