//! Certificate provider pages.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Form};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{not_ready, task_list_path};
use crate::actor::{
    ActorKind, ActorType, Address, CertificateProviderProvidedDetails, IdentityUserData,
};
use crate::handlers::{AppState, HandlerResult};
use crate::session::RequestIdentity;
use crate::task::certificate_provider::{self as tasks, CertificateProviderTask};

pub async fn task_list(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(certificate_provider): Extension<CertificateProviderProvidedDetails>,
) -> HandlerResult {
    let lpa = state.repositories.donors.get_any(&identity).await?;

    Ok(state.renderer.render(
        "certificate_provider_task_list",
        json!({
            "lpa_id": lpa.lpa_id,
            "lpa_uid": lpa.lpa_uid,
            "actor_type": ActorType::CertificateProvider,
            "donor_full_name": lpa.donor.full_name(),
            "certificate_provided": certificate_provider.certificate.agree_to_statement,
            "tasks": tasks::task_list(&certificate_provider, &lpa),
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HomeAddressForm {
    pub line1: String,
    pub line2: String,
    pub town_or_city: String,
    pub postcode: String,
}

pub async fn confirm_your_details(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut certificate_provider): Extension<CertificateProviderProvidedDetails>,
    Form(form): Form<HomeAddressForm>,
) -> HandlerResult {
    certificate_provider.home_address = Some(Address {
        line1: form.line1,
        line2: form.line2,
        town_or_city: form.town_or_city,
        postcode: form.postcode,
        country: "GB".to_string(),
        ..Default::default()
    });
    complete(
        &state,
        &identity,
        certificate_provider,
        CertificateProviderTask::ConfirmYourDetails,
    )
    .await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdentityForm {
    pub first_names: String,
    pub last_name: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
}

/// Record the outcome of an identity check.
pub async fn confirm_your_identity(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut certificate_provider): Extension<CertificateProviderProvidedDetails>,
    Form(form): Form<IdentityForm>,
) -> HandlerResult {
    let date_of_birth = NaiveDate::parse_from_str(&form.date_of_birth, "%Y-%m-%d").ok();

    certificate_provider.identity_user_data = Some(IdentityUserData {
        confirmed: date_of_birth.is_some() && !form.last_name.is_empty(),
        first_names: form.first_names,
        last_name: form.last_name,
        date_of_birth,
        retrieved_at: Some((state.now)()),
    });

    if !certificate_provider.identity_confirmed() {
        let back = task_list_path(ActorType::CertificateProvider, &identity.lpa_id);
        state
            .repositories
            .certificate_providers
            .put(&identity, &mut certificate_provider)
            .await?;
        return Ok(Redirect::to(&back).into_response());
    }

    complete(
        &state,
        &identity,
        certificate_provider,
        CertificateProviderTask::ConfirmYourIdentity,
    )
    .await
}

pub async fn read_the_lpa(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(certificate_provider): Extension<CertificateProviderProvidedDetails>,
) -> HandlerResult {
    complete(
        &state,
        &identity,
        certificate_provider,
        CertificateProviderTask::ReadTheLpa,
    )
    .await
}

async fn complete(
    state: &AppState,
    identity: &RequestIdentity,
    mut certificate_provider: CertificateProviderProvidedDetails,
    task: CertificateProviderTask,
) -> HandlerResult {
    let lpa = state.repositories.donors.get_any(identity).await?;
    let back = task_list_path(ActorType::CertificateProvider, &lpa.lpa_id);

    if let Err(e) = tasks::complete(task, &mut certificate_provider, &lpa) {
        return Ok(not_ready(e, &back));
    }
    state
        .repositories
        .certificate_providers
        .put(identity, &mut certificate_provider)
        .await?;

    Ok(Redirect::to(&back).into_response())
}

/// Agree to the certificate statement. Both the certificate provider's
/// record and the LPA are updated.
pub async fn provide_certificate(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut certificate_provider): Extension<CertificateProviderProvidedDetails>,
) -> HandlerResult {
    let mut lpa = state.repositories.donors.get_any(&identity).await?;
    let back = task_list_path(ActorType::CertificateProvider, &lpa.lpa_id);

    if let Err(e) = tasks::provide_certificate(&mut certificate_provider, &mut lpa, (state.now)()) {
        return Ok(not_ready(e, &back));
    }
    state
        .repositories
        .certificate_providers
        .put(&identity, &mut certificate_provider)
        .await?;
    state.repositories.donors.put(&mut lpa).await?;

    info!(lpa_id = %lpa.lpa_id, "Certificate provided");
    Ok(Redirect::to(&back).into_response())
}

pub async fn opt_out(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    state
        .invitations
        .withdraw(&identity, ActorKind::CertificateProvider)
        .await?;
    Ok(Redirect::to("/dashboard").into_response())
}
