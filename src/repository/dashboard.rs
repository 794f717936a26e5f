//! "Your LPAs" across every role the caller holds.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{by_recency, resolve_lpa, Recency, Result};
use crate::actor::{
    ActorKind, ActorType, AttorneyProvidedDetails, CertificateProviderProvidedDetails,
    DonorProvidedDetails, LpaLink,
};
use crate::session::RequestIdentity;
use crate::storage::keys::{self, Keys};
use crate::storage::{Item, RecordStore, ACTOR_INDEX};
use crate::task::Progress;

/// One LPA on the dashboard, with the caller's own record for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpaAndActorTasks {
    pub lpa: DonorProvidedDetails,
    pub attorney: Option<AttorneyProvidedDetails>,
    pub certificate_provider: Option<CertificateProviderProvidedDetails>,
    pub progress: Progress,
}

impl Recency for LpaAndActorTasks {
    fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.lpa.updated_at
    }

    fn lpa_id(&self) -> &str {
        &self.lpa.lpa_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardResults {
    pub donor: Vec<LpaAndActorTasks>,
    pub attorney: Vec<LpaAndActorTasks>,
    pub certificate_provider: Vec<LpaAndActorTasks>,
}

impl DashboardResults {
    pub fn is_empty(&self) -> bool {
        self.donor.is_empty() && self.attorney.is_empty() && self.certificate_provider.is_empty()
    }
}

pub struct DashboardStore {
    store: Arc<dyn RecordStore>,
}

impl DashboardStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Every LPA the caller is party to, bucketed by role.
    ///
    /// Pointers found on the ActorIndex name the LPA record and the role; the
    /// LPA records and the caller's own actor records are then read in one
    /// batch. An LPA whose actor record is missing is left out of the
    /// attorney and certificate provider buckets.
    pub async fn get_all(&self, identity: &RequestIdentity) -> Result<DashboardResults> {
        let session_id = identity.session()?;

        let links = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::sub_key(session_id))
            .await?
            .iter()
            .map(LpaLink::from_item)
            .collect::<crate::storage::Result<Vec<_>>>()?;

        if links.is_empty() {
            return Ok(DashboardResults::default());
        }

        let mut wanted = BTreeSet::new();
        for link in &links {
            let Some(lpa_id) = link.lpa_id() else {
                continue;
            };
            wanted.insert(link.lpa_keys());
            match link.actor_type.kind() {
                ActorKind::Attorney => {
                    wanted.insert(keys::attorney_keys(lpa_id, session_id).record());
                }
                ActorKind::CertificateProvider => {
                    wanted.insert(keys::certificate_provider_keys(lpa_id, session_id));
                }
                ActorKind::Donor | ActorKind::Supporter => {}
            }
        }

        let wanted: Vec<Keys> = wanted.into_iter().collect();
        let mut items: HashMap<Keys, Item> = self
            .store
            .get_all_by_keys(&wanted)
            .await?
            .into_iter()
            .map(|item| (item.keys(), item))
            .collect();

        let mut results = DashboardResults::default();
        for link in &links {
            let Some(lpa_id) = link.lpa_id() else {
                continue;
            };
            let Some(lpa_item) = items.get(&link.lpa_keys()).cloned() else {
                continue;
            };
            let lpa = resolve_lpa(&self.store, lpa_item).await?;

            match link.actor_type.kind() {
                ActorKind::Donor => {
                    results.donor.push(entry(lpa, None, None));
                }
                ActorKind::Attorney => {
                    let keys = keys::attorney_keys(lpa_id, session_id).record();
                    if let Some(item) = items.remove(&keys) {
                        results.attorney.push(entry(lpa, Some(item.decode()?), None));
                    }
                }
                ActorKind::CertificateProvider => {
                    let keys = keys::certificate_provider_keys(lpa_id, session_id);
                    if let Some(item) = items.remove(&keys) {
                        results
                            .certificate_provider
                            .push(entry(lpa, None, Some(item.decode()?)));
                    }
                }
                ActorKind::Supporter => {}
            }
        }

        results.donor.sort_by(by_recency);
        results.attorney.sort_by(by_recency);
        results.certificate_provider.sort_by(by_recency);

        debug!(
            donor = results.donor.len(),
            attorney = results.attorney.len(),
            certificate_provider = results.certificate_provider.len(),
            "Loaded dashboard"
        );
        Ok(results)
    }

    /// Whether the caller holds any role of the same kind as `actor_type`.
    pub async fn sub_exists_for_actor_type(
        &self,
        identity: &RequestIdentity,
        actor_type: ActorType,
    ) -> Result<bool> {
        let session_id = identity.session()?;
        let items = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::sub_key(session_id))
            .await?;

        for item in &items {
            if LpaLink::from_item(item)?.actor_type.kind() == actor_type.kind() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Progress is computed from the caller's own records only.
fn entry(
    lpa: DonorProvidedDetails,
    attorney: Option<AttorneyProvidedDetails>,
    certificate_provider: Option<CertificateProviderProvidedDetails>,
) -> LpaAndActorTasks {
    let progress = Progress::compute(&lpa, attorney.as_slice());
    LpaAndActorTasks {
        lpa,
        attorney,
        certificate_provider,
        progress,
    }
}
