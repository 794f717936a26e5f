//! Certificate-provider-provided details.

use std::sync::Arc;

use tracing::info;

use super::{by_recency, create_with_link, Error, Result};
use crate::actor::{ActorType, CertificateProviderProvidedDetails, LpaLink, ShareCodeData};
use crate::session::RequestIdentity;
use crate::storage::keys;
use crate::storage::{Item, RecordStore, ACTOR_INDEX};
use crate::utils::clock::Now;

pub struct CertificateProviderStore {
    store: Arc<dyn RecordStore>,
    now: Now,
}

impl CertificateProviderStore {
    pub fn new(store: Arc<dyn RecordStore>, now: Now) -> Self {
        Self { store, now }
    }

    /// Bind the caller to the LPA as its certificate provider. Errors as for
    /// [`AttorneyStore::create`](super::AttorneyStore::create).
    pub async fn create(
        &self,
        identity: &RequestIdentity,
        share: &ShareCodeData,
    ) -> Result<CertificateProviderProvidedDetails> {
        let (lpa_id, session_id) = identity.lpa_and_session("certificate_provider_store.create")?;
        let keys = keys::certificate_provider_keys(lpa_id, session_id);

        let certificate_provider = CertificateProviderProvidedDetails {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
            uid: share.actor_uid,
            lpa_id: lpa_id.to_string(),
            updated_at: (self.now)(),
            email: identity.email.clone(),
            share_key: Some(share.keys()),
            ..Default::default()
        };

        let link = LpaLink::new(
            lpa_id,
            session_id,
            &share.lpa_owner_key,
            ActorType::CertificateProvider,
        );
        create_with_link(
            &self.store,
            Item::encode(keys, &certificate_provider)?,
            &link,
        )
        .await?;

        info!(lpa_id = %lpa_id, "Created certificate provider");
        Ok(certificate_provider)
    }

    pub async fn get(&self, identity: &RequestIdentity) -> Result<CertificateProviderProvidedDetails> {
        let (lpa_id, session_id) = identity.lpa_and_session("certificate_provider_store.get")?;
        let item = self
            .store
            .get(&keys::certificate_provider_keys(lpa_id, session_id))
            .await?;
        Ok(item.decode()?)
    }

    /// The certificate provider on `identity.lpa_id`, for the other actors.
    pub async fn get_any(
        &self,
        identity: &RequestIdentity,
    ) -> Result<CertificateProviderProvidedDetails> {
        let lpa_id = identity.lpa("certificate_provider_store.get_any")?;
        let item = self
            .store
            .get_one_by_partial_sk(&keys::lpa_key(lpa_id), keys::CERTIFICATE_PROVIDER_PREFIX)
            .await?;
        Ok(item.decode()?)
    }

    pub async fn get_all(
        &self,
        identity: &RequestIdentity,
    ) -> Result<Vec<CertificateProviderProvidedDetails>> {
        let session_id = identity.session()?;
        let mut certificate_providers = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::certificate_provider_key(session_id))
            .await?
            .iter()
            .map(Item::decode)
            .collect::<crate::storage::Result<Vec<CertificateProviderProvidedDetails>>>()?;

        certificate_providers.sort_by(by_recency);
        Ok(certificate_providers)
    }

    pub async fn put(
        &self,
        identity: &RequestIdentity,
        certificate_provider: &mut CertificateProviderProvidedDetails,
    ) -> Result<()> {
        let session_id = identity.session()?;
        if certificate_provider.sk != keys::certificate_provider_key(session_id) {
            return Err(Error::AccessDenied(format!(
                "certificate provider record {} does not belong to the caller",
                certificate_provider.sk
            )));
        }

        certificate_provider.updated_at = (self.now)();
        self.store
            .put(Item::encode(certificate_provider.keys(), certificate_provider)?)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, identity: &RequestIdentity) -> Result<()> {
        let (lpa_id, session_id) = identity.lpa_and_session("certificate_provider_store.delete")?;

        self.store
            .delete(&keys::certificate_provider_keys(lpa_id, session_id))
            .await?;
        self.store.delete(&keys::sub_keys(lpa_id, session_id)).await?;
        Ok(())
    }
}
