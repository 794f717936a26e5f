//! Donor-owned LPA records.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{by_recency, resolve_lpa, Error, Result};
use crate::actor::{ActorType, DonorProvidedDetails, LpaLink, LpaReference, ShareCodeData};
use crate::session::RequestIdentity;
use crate::storage::keys::{self, Keys};
use crate::storage::{Item, RecordStore, ACTOR_INDEX};
use crate::utils::clock::Now;

/// Repository for LPA records as the donor sees them.
///
/// Organisation-created LPAs are owned by `#ORGANISATION#<id>`; a donor who
/// links to one gets an [`LpaReference`] under their own sort key, which
/// reads follow transparently.
pub struct DonorStore {
    store: Arc<dyn RecordStore>,
    now: Now,
}

impl DonorStore {
    pub fn new(store: Arc<dyn RecordStore>, now: Now) -> Self {
        Self { store, now }
    }

    /// Start a new LPA owned by the caller.
    pub async fn create(&self, identity: &RequestIdentity) -> Result<DonorProvidedDetails> {
        let session_id = identity.session()?;
        let lpa_id = Uuid::new_v4().to_string();
        let now = (self.now)();

        let keys = keys::donor_keys(&lpa_id, session_id);
        let mut lpa = DonorProvidedDetails {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
            lpa_id: lpa_id.clone(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        lpa.donor.uid = Uuid::new_v4();
        lpa.donor.email = identity.email.clone();

        self.store.create(Item::encode(keys.clone(), &lpa)?).await?;
        self.store
            .create(LpaLink::new(&lpa_id, session_id, &keys.sk, ActorType::Donor).to_item())
            .await?;

        info!(lpa_id = %lpa_id, "Created LPA");
        Ok(lpa)
    }

    /// The caller's LPA: the donor's own, or the organisation's when the
    /// caller acts for one.
    pub async fn get(&self, identity: &RequestIdentity) -> Result<DonorProvidedDetails> {
        let (lpa_id, session_id) = identity.lpa_and_session("donor_store.get")?;

        let sk = if identity.is_organisation() {
            keys::organisation_key(&identity.organisation_id)
        } else {
            keys::donor_key(session_id)
        };

        let item = self.store.get(&Keys::new(keys::lpa_key(lpa_id), sk)).await?;
        resolve_lpa(&self.store, item).await
    }

    /// The LPA record for `identity.lpa_id`, whoever owns it. Used by the
    /// other actors on the LPA.
    pub async fn get_any(&self, identity: &RequestIdentity) -> Result<DonorProvidedDetails> {
        let lpa_id = identity.lpa("donor_store.get_any")?;
        let pk = keys::lpa_key(lpa_id);

        let item = match self
            .store
            .get_one_by_partial_sk(&pk, keys::DONOR_PREFIX)
            .await
        {
            Ok(item) => item,
            Err(e) if e.is_not_found() => {
                self.store
                    .get_one_by_partial_sk(&pk, keys::ORGANISATION_PREFIX)
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        resolve_lpa(&self.store, item).await
    }

    /// Every LPA the caller owns as donor, most recently updated first.
    pub async fn get_all(&self, identity: &RequestIdentity) -> Result<Vec<DonorProvidedDetails>> {
        let session_id = identity.session()?;

        let items = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::donor_key(session_id))
            .await?;

        let mut lpas = Vec::with_capacity(items.len());
        for item in items {
            lpas.push(resolve_lpa(&self.store, item).await?);
        }
        lpas.sort_by(by_recency);

        debug!(count = lpas.len(), "Loaded donor LPAs");
        Ok(lpas)
    }

    /// Stamp `updated_at` and upsert.
    pub async fn put(&self, lpa: &mut DonorProvidedDetails) -> Result<()> {
        lpa.updated_at = (self.now)();
        self.store.put(Item::encode(lpa.keys(), lpa)?).await?;
        Ok(())
    }

    /// Attach the caller as donor of an organisation-created LPA.
    pub async fn link(&self, identity: &RequestIdentity, share: &ShareCodeData) -> Result<()> {
        let session_id = identity.session()?;
        let lpa_id = share.lpa_id().ok_or(Error::MissingSessionData {
            operation: "donor_store.link",
            required: "lpa_id",
        })?;

        let reference = LpaReference {
            pk: share.lpa_key.clone(),
            sk: keys::donor_key(session_id),
            referenced_sk: share.lpa_owner_key.clone(),
        };
        self.store
            .create(Item::encode(Keys::new(&reference.pk, &reference.sk), &reference)?)
            .await?;

        let link = LpaLink::new(lpa_id, session_id, &share.lpa_owner_key, ActorType::Donor);
        self.store.create(link.to_item()).await?;

        info!(lpa_id = %lpa_id, "Linked donor to organisation LPA");
        Ok(())
    }

    /// Undo [`link`](Self::link) for whoever redeemed `share`.
    pub async fn delete_link(&self, share: &ShareCodeData) -> Result<()> {
        let (Some(lpa_id), Some(session_id)) = (share.lpa_id(), share.redeemed_by.as_deref())
        else {
            return Ok(());
        };

        self.store.delete(&keys::donor_keys(lpa_id, session_id)).await?;
        self.store.delete(&keys::sub_keys(lpa_id, session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
