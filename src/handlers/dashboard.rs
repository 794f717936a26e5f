//! The signed-in dashboard listing every LPA the caller is bound to.

use axum::extract::State;
use axum::Extension;
use serde_json::json;

use super::{AppState, HandlerResult};
use crate::session::RequestIdentity;

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> HandlerResult {
    let results = state.repositories.dashboard.get_all(&identity).await?;

    let roles_present = [
        !results.donor.is_empty(),
        !results.attorney.is_empty(),
        !results.certificate_provider.is_empty(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();

    Ok(state.renderer.render(
        "dashboard",
        json!({
            "use_tabs": roles_present > 1,
            "donor": serde_json::to_value(&results.donor)?,
            "attorney": serde_json::to_value(&results.attorney)?,
            "certificate_provider": serde_json::to_value(&results.certificate_provider)?,
        }),
    ))
}
