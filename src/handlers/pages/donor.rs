//! Donor pages.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::Extension;
use serde_json::json;
use tracing::{info, warn};

use super::task_list_path;
use crate::actor::{ActorType, DonorProvidedDetails};
use crate::handlers::{AppState, HandlerResult};
use crate::session::RequestIdentity;
use crate::task::{LpaStage, Progress, TaskState};

/// Start a new LPA for the logged-in donor.
pub async fn make_a_new_lpa(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    let identity = RequestIdentity {
        organisation_id: String::new(),
        ..identity
    };
    let lpa = state.repositories.donors.create(&identity).await?;
    Ok(Redirect::to(&task_list_path(ActorType::Donor, &lpa.lpa_id)).into_response())
}

pub async fn task_list(
    State(state): State<AppState>,
    Extension(lpa): Extension<DonorProvidedDetails>,
) -> HandlerResult {
    Ok(state.renderer.render(
        "donor_task_list",
        json!({
            "lpa_id": lpa.lpa_id,
            "lpa_uid": lpa.lpa_uid,
            "lpa_type": lpa.lpa_type,
            "stage": format!("{:?}", LpaStage::of(&lpa)),
            "ready_to_sign": lpa.tasks.ready_to_sign(),
            "tasks": serde_json::to_value(&lpa.tasks)?,
            "progress": Progress::compute(&lpa, &[]),
        }),
    ))
}

/// Sign the LPA once every earlier task is done.
pub async fn sign(
    State(state): State<AppState>,
    Extension(mut lpa): Extension<DonorProvidedDetails>,
) -> HandlerResult {
    let back = task_list_path(ActorType::Donor, &lpa.lpa_id);
    if lpa.signed() {
        return Ok(Redirect::to(&back).into_response());
    }
    if !lpa.tasks.ready_to_sign() {
        warn!(lpa_id = %lpa.lpa_id, "Donor tried to sign before the LPA was ready");
        return Ok(Redirect::to(&back).into_response());
    }

    lpa.signed_at = Some((state.now)());
    lpa.tasks.sign_the_lpa = TaskState::Completed;
    state.repositories.donors.put(&mut lpa).await?;

    info!(lpa_id = %lpa.lpa_id, "Donor signed");
    Ok(Redirect::to(&back).into_response())
}

/// Send share codes to the certificate provider and every attorney.
pub async fn send_invites(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(lpa): Extension<DonorProvidedDetails>,
) -> HandlerResult {
    state
        .invitations
        .send_certificate_provider_invite(&identity, &lpa)
        .await?;
    let attorneys = state.invitations.send_attorneys(&identity, &lpa).await?;

    info!(lpa_id = %lpa.lpa_id, attorneys = attorneys.len(), "Sent invites");
    Ok(Redirect::to(&task_list_path(ActorType::Donor, &lpa.lpa_id)).into_response())
}
