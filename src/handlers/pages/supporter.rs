//! Supporter pages: organisations, their members and the LPAs they start
//! on behalf of donors.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use super::task_list_path;
use crate::actor::{ActorType, DonorProvidedDetails, MemberInvite, Organisation, Permission};
use crate::handlers::{AppState, HandlerResult};
use crate::services::{InvitationError, Invitee};
use crate::session::RequestIdentity;
use crate::task::TaskError;
use crate::utils::random;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrganisationForm {
    pub name: String,
}

/// Create an organisation with the caller as admin. Only needs a login.
pub async fn create_organisation(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(form): Form<OrganisationForm>,
) -> HandlerResult {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(state.renderer.render(
            "create_organisation",
            json!({ "errors": { "name": "enter your organisation name" } }),
        ));
    }

    state
        .repositories
        .organisations
        .create(&identity, name)
        .await?;
    Ok(Redirect::to("/supporter/dashboard").into_response())
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(organisation): Extension<Organisation>,
) -> HandlerResult {
    let lpas = state.repositories.organisations.lpas(&identity).await?;

    Ok(state.renderer.render(
        "supporter_dashboard",
        json!({
            "organisation": organisation.name,
            "lpas": lpas
                .iter()
                .map(|lpa| json!({ "lpa_id": lpa.lpa_id, "donor": lpa.donor.full_name() }))
                .collect::<Vec<_>>(),
        }),
    ))
}

pub async fn create_lpa(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    let lpa = state.repositories.organisations.create_lpa(&identity).await?;
    Ok(Redirect::to(&task_list_path(ActorType::Supporter, &lpa.lpa_id)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemberInviteForm {
    pub email: String,
    pub first_names: String,
    pub last_name: String,
    pub admin: bool,
}

pub async fn invite_member(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(organisation): Extension<Organisation>,
    Form(form): Form<MemberInviteForm>,
) -> HandlerResult {
    let invite = MemberInvite {
        email: form.email,
        first_names: form.first_names,
        last_name: form.last_name,
        permission: if form.admin {
            Permission::Admin
        } else {
            Permission::None
        },
        reference_number: random::code(12),
        ..Default::default()
    };

    state
        .repositories
        .organisations
        .create_member_invite(&identity, &organisation, invite)
        .await?;
    Ok(Redirect::to("/supporter/members").into_response())
}

pub async fn members(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    let invites = state
        .repositories
        .organisations
        .member_invites(&identity)
        .await?;
    Ok(state.renderer.render(
        "manage_members",
        json!({ "invites": serde_json::to_value(&invites)? }),
    ))
}

pub async fn view_lpa(
    State(state): State<AppState>,
    Extension(lpa): Extension<DonorProvidedDetails>,
) -> HandlerResult {
    Ok(state
        .renderer
        .render("supporter_view_lpa", json!({ "lpa": serde_json::to_value(&lpa)? })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DonorAccessForm {
    pub email: String,
}

/// Send the donor a share code giving them access to the LPA.
pub async fn donor_access(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(lpa): Extension<DonorProvidedDetails>,
    Form(form): Form<DonorAccessForm>,
) -> HandlerResult {
    let invitee = Invitee {
        uid: lpa.donor.uid,
        full_name: lpa.donor.full_name(),
        email: form.email,
    };
    let code = state
        .invitations
        .issue(&identity, ActorType::Donor, &lpa, &invitee)
        .await?;

    Ok(state.renderer.render(
        "donor_access",
        json!({ "lpa_id": lpa.lpa_id, "email": invitee.email, "reference_number": code }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RemoveDonorAccessForm {
    pub reference_number: String,
}

pub async fn remove_donor_access(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(lpa): Extension<DonorProvidedDetails>,
    Form(form): Form<RemoveDonorAccessForm>,
) -> HandlerResult {
    match state
        .invitations
        .remove_donor_access(&identity, &form.reference_number)
        .await
    {
        Ok(()) => {
            Ok(Redirect::to(&task_list_path(ActorType::Supporter, &lpa.lpa_id)).into_response())
        }
        Err(InvitationError::Task(TaskError::Refused { reason, .. })) => Ok(state.renderer.render(
            "donor_access",
            json!({ "lpa_id": lpa.lpa_id, "errors": { "reference_number": reason } }),
        )),
        Err(InvitationError::IncorrectReferenceNumber) => Ok(state.renderer.render(
            "donor_access",
            json!({
                "lpa_id": lpa.lpa_id,
                "errors": { "reference_number": "incorrect reference number" },
            }),
        )),
        Err(e) => Err(e.into()),
    }
}
