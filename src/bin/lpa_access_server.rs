//! lpa-access-server: HTTP service for LPA actors
//!
//! ## Configuration
//! ```yaml
//! server:
//!   port: 5050
//!   app_public_url: https://lpa.example.gov.uk
//! storage:
//!   type: dynamo
//!   dynamo:
//!     table_name: lpa-access
//! identity:
//!   issuer: https://oidc.example.gov.uk
//!   client_id: lpa-access
//! notify:
//!   enabled: true
//!   base_url: https://notify.example.gov.uk
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `LPA_ACCESS__STORAGE__TYPE=sqlite`.

use tracing::info;

use lpa_access::config::Config;
use lpa_access::handlers::{self, AppState};
use lpa_access::storage::init_storage;
use lpa_access::utils::bootstrap::{init_tracing, with_startup_retry};

const STORAGE_CONNECT_ATTEMPTS: u32 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = Config::load(None)?;
    info!(
        storage = %config.storage.storage_type,
        port = config.server.port,
        "starting lpa-access-server"
    );

    let store = with_startup_retry("storage", STORAGE_CONNECT_ATTEMPTS, || {
        init_storage(&config.storage)
    })
    .await?;

    let state = AppState::from_config(&config, store)?;
    handlers::serve(state, &config.server.host, config.server.port).await
}
