//! Router builder and server entry point.

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::{
    attorney_session, certificate_provider_session, donor_session, login_session,
    supporter_lpa_session, supporter_session,
};
use super::pages::{self, attorney, certificate_provider, donor, supporter};
use super::{auth, dashboard, reference, AppState};

/// Start the HTTP server.
///
/// When `port` is 0, the OS assigns an ephemeral port. The actual bound
/// port is always logged.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let actual_port = listener.local_addr()?.port();
    info!(host = %host, port = actual_port, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/start", get(pages::donor_start))
        .route("/attorney-start", get(pages::attorney_start))
        .route(
            "/certificate-provider-start",
            get(pages::certificate_provider_start),
        )
        .route("/supporter-start", get(pages::supporter_start))
        .route("/login", get(auth::login))
        .route("/login-callback", get(auth::login_callback))
        .route("/sign-out", get(auth::sign_out));

    let logged_in = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/make-a-new-lpa", post(donor::make_a_new_lpa))
        .route(
            "/enter-access-code",
            get(reference::donor_form).post(reference::donor_redeem),
        )
        .route(
            "/attorney/enter-reference-number",
            get(reference::attorney_form).post(reference::attorney_redeem),
        )
        .route(
            "/attorney/enter-reference-number-opt-out",
            post(reference::attorney_opt_out),
        )
        .route(
            "/certificate-provider/enter-reference-number",
            get(reference::certificate_provider_form).post(reference::certificate_provider_redeem),
        )
        .route(
            "/certificate-provider/enter-reference-number-opt-out",
            post(reference::certificate_provider_opt_out),
        )
        .route(
            "/supporter/create-organisation",
            post(supporter::create_organisation),
        )
        .route_layer(from_fn_with_state(state.clone(), login_session));

    let attorney = Router::new()
        .route("/attorney/:lpa_id/task-list", get(attorney::task_list))
        .route(
            "/attorney/:lpa_id/confirm-your-details",
            post(attorney::confirm_your_details),
        )
        .route("/attorney/:lpa_id/read-the-lpa", post(attorney::read_the_lpa))
        .route("/attorney/:lpa_id/sign", post(attorney::sign))
        .route(
            "/attorney/:lpa_id/would-like-second-signatory",
            post(attorney::would_like_second_signatory),
        )
        .route("/attorney/:lpa_id/opt-out", post(attorney::opt_out))
        .route_layer(from_fn_with_state(state.clone(), attorney_session));

    let certificate_provider = Router::new()
        .route(
            "/certificate-provider/:lpa_id/task-list",
            get(certificate_provider::task_list),
        )
        .route(
            "/certificate-provider/:lpa_id/enter-date-of-birth",
            post(certificate_provider::confirm_your_details),
        )
        .route(
            "/certificate-provider/:lpa_id/prove-your-identity",
            post(certificate_provider::confirm_your_identity),
        )
        .route(
            "/certificate-provider/:lpa_id/read-the-lpa",
            post(certificate_provider::read_the_lpa),
        )
        .route(
            "/certificate-provider/:lpa_id/provide-certificate",
            post(certificate_provider::provide_certificate),
        )
        .route(
            "/certificate-provider/:lpa_id/opt-out",
            post(certificate_provider::opt_out),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            certificate_provider_session,
        ));

    let donor = Router::new()
        .route("/lpa/:lpa_id/task-list", get(donor::task_list))
        .route("/lpa/:lpa_id/sign", post(donor::sign))
        .route("/lpa/:lpa_id/send-invites", post(donor::send_invites))
        .route_layer(from_fn_with_state(state.clone(), donor_session));

    let supporter = Router::new()
        .route("/supporter/dashboard", get(supporter::dashboard))
        .route("/supporter/lpa", post(supporter::create_lpa))
        .route("/supporter/members", get(supporter::members))
        .route("/supporter/invite-member", post(supporter::invite_member))
        .route_layer(from_fn_with_state(state.clone(), supporter_session));

    let supporter_lpa = Router::new()
        .route("/supporter/:lpa_id/view-lpa", get(supporter::view_lpa))
        .route("/supporter/:lpa_id/donor-access", post(supporter::donor_access))
        .route(
            "/supporter/:lpa_id/remove-donor-access",
            post(supporter::remove_donor_access),
        )
        .route_layer(from_fn_with_state(state.clone(), supporter_lpa_session));

    Router::new()
        .merge(public)
        .merge(logged_in)
        .merge(attorney)
        .merge(certificate_provider)
        .merge(donor)
        .merge(supporter)
        .merge(supporter_lpa)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}
