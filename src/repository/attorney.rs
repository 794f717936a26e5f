//! Attorney-provided details.

use std::sync::Arc;

use tracing::info;

use super::{by_recency, create_with_link, Error, Result};
use crate::actor::{AttorneyProvidedDetails, LpaLink, ShareCodeData};
use crate::session::RequestIdentity;
use crate::storage::keys;
use crate::storage::{Item, RecordStore, ACTOR_INDEX};
use crate::utils::clock::Now;

pub struct AttorneyStore {
    store: Arc<dyn RecordStore>,
    now: Now,
}

impl AttorneyStore {
    pub fn new(store: Arc<dyn RecordStore>, now: Now) -> Self {
        Self { store, now }
    }

    /// Bind the caller to the LPA as the attorney the share code names.
    ///
    /// Fails with `AlreadyExists` when the caller already holds the record,
    /// and with `LinkWriteFailed` when only the pointer could not be written.
    pub async fn create(
        &self,
        identity: &RequestIdentity,
        share: &ShareCodeData,
    ) -> Result<AttorneyProvidedDetails> {
        let (lpa_id, session_id) = identity.lpa_and_session("attorney_store.create")?;
        let keys = keys::attorney_keys(lpa_id, session_id);

        let attorney = AttorneyProvidedDetails {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
            uid: share.actor_uid,
            lpa_id: lpa_id.to_string(),
            updated_at: (self.now)(),
            is_replacement: share.is_replacement_attorney,
            is_trust_corporation: share.is_trust_corporation,
            share_key: Some(share.keys()),
            ..Default::default()
        };

        let link = LpaLink::new(
            lpa_id,
            session_id,
            &share.lpa_owner_key,
            attorney.actor_type(),
        );
        create_with_link(&self.store, Item::encode(keys.record(), &attorney)?, &link).await?;

        info!(lpa_id = %lpa_id, actor_type = %attorney.actor_type(), "Created attorney");
        Ok(attorney)
    }

    pub async fn get(&self, identity: &RequestIdentity) -> Result<AttorneyProvidedDetails> {
        let (lpa_id, session_id) = identity.lpa_and_session("attorney_store.get")?;
        let item = self
            .store
            .get(&keys::attorney_keys(lpa_id, session_id).record())
            .await?;
        Ok(item.decode()?)
    }

    /// Every attorney record the caller holds, most recently updated first.
    pub async fn get_all(&self, identity: &RequestIdentity) -> Result<Vec<AttorneyProvidedDetails>> {
        let session_id = identity.session()?;
        let mut attorneys = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::attorney_key(session_id))
            .await?
            .iter()
            .map(Item::decode)
            .collect::<crate::storage::Result<Vec<AttorneyProvidedDetails>>>()?;

        attorneys.sort_by(by_recency);
        Ok(attorneys)
    }

    /// Stamp `updated_at` and upsert. Only the caller's own record may be
    /// written.
    pub async fn put(
        &self,
        identity: &RequestIdentity,
        attorney: &mut AttorneyProvidedDetails,
    ) -> Result<()> {
        let session_id = identity.session()?;
        if attorney.sk != keys::attorney_key(session_id) {
            return Err(Error::AccessDenied(format!(
                "attorney record {} does not belong to the caller",
                attorney.sk
            )));
        }

        attorney.updated_at = (self.now)();
        self.store.put(Item::encode(attorney.keys(), attorney)?).await?;
        Ok(())
    }

    /// Remove the caller's attorney record and its pointer.
    pub async fn delete(&self, identity: &RequestIdentity) -> Result<()> {
        let (lpa_id, session_id) = identity.lpa_and_session("attorney_store.delete")?;
        let keys = keys::attorney_keys(lpa_id, session_id);

        self.store.delete(&keys.record()).await?;
        self.store.delete(&keys.sub()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::actor::ActorType;
    use crate::storage::{Keys, MockRecordStore};
    use crate::utils::clock;

    fn share(is_replacement: bool, is_trust_corporation: bool) -> ShareCodeData {
        ShareCodeData {
            pk: "ATTORNEYSHARE#code".to_string(),
            sk: "#METADATA#code".to_string(),
            lpa_key: "LPA#lpa".to_string(),
            lpa_owner_key: "#DONOR#donor".to_string(),
            actor_uid: Uuid::new_v4(),
            is_replacement_attorney: is_replacement,
            is_trust_corporation,
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MockRecordStore>, AttorneyStore) {
        let mock = Arc::new(MockRecordStore::new());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        (mock.clone(), AttorneyStore::new(mock, clock::fixed(at)))
    }

    #[tokio::test]
    async fn test_create_writes_record_and_pointer() {
        let (mock, store) = setup();
        let identity = RequestIdentity::new("sess").with_lpa("lpa");
        let share = share(true, false);

        let attorney = store.create(&identity, &share).await.unwrap();

        assert_eq!(attorney.pk, "LPA#lpa");
        assert_eq!(attorney.sk, "#ATTORNEY#sess");
        assert_eq!(attorney.uid, share.actor_uid);
        assert_eq!(attorney.actor_type(), ActorType::ReplacementAttorney);
        assert_eq!(attorney.share_key, Some(share.keys()));
        assert_eq!(store.get(&identity).await.unwrap(), attorney);

        let pointer = mock.get(&Keys::new("LPA#lpa", "#SUB#sess")).await.unwrap();
        assert_eq!(pointer.data, "#DONOR#donor|REPLACEMENT_ATTORNEY");
    }

    #[tokio::test]
    async fn test_create_twice_reports_already_exists() {
        let (mock, store) = setup();
        let identity = RequestIdentity::new("sess").with_lpa("lpa");

        store.create(&identity, &share(false, false)).await.unwrap();
        let err = store
            .create(&identity, &share(false, false))
            .await
            .unwrap_err();

        assert!(err.is_already_exists());
        assert_eq!(mock.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_pointer_failure_keeps_record() {
        let (mock, store) = setup();
        mock.set_fail_on_create_prefix(Some(keys::SUB_PREFIX)).await;
        let identity = RequestIdentity::new("sess").with_lpa("lpa");

        let err = store
            .create(&identity, &share(false, true))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LinkWriteFailed { .. }));
        assert!(store.get(&identity).await.unwrap().is_trust_corporation);
    }

    #[tokio::test]
    async fn test_session_required_guards() {
        let (_, store) = setup();
        let empty = RequestIdentity::default();

        assert!(matches!(
            store.get(&empty).await,
            Err(Error::SessionMissing)
        ));
        assert!(matches!(
            store.create(&empty, &share(false, false)).await,
            Err(Error::SessionMissing)
        ));
        assert!(matches!(
            store.get_all(&empty).await,
            Err(Error::SessionMissing)
        ));
        assert!(matches!(
            store.get(&RequestIdentity::new("sess")).await,
            Err(Error::MissingSessionData {
                operation: "attorney_store.get",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_get_all_across_lpas() {
        let mock = Arc::new(MockRecordStore::new());
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for (lpa, hours) in [("x", 2), ("y", 7), ("z", 2)] {
            let store = AttorneyStore::new(mock.clone(), clock::fixed(base + Duration::hours(hours)));
            store
                .create(&RequestIdentity::new("sess").with_lpa(lpa), &share(false, false))
                .await
                .unwrap();
        }
        let other = AttorneyStore::new(mock.clone(), clock::fixed(base));
        other
            .create(&RequestIdentity::new("someone-else").with_lpa("x"), &share(false, false))
            .await
            .unwrap();

        let ids: Vec<_> = other
            .get_all(&RequestIdentity::new("sess"))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.lpa_id)
            .collect();
        assert_eq!(ids, ["y", "x", "z"]);
    }

    #[tokio::test]
    async fn test_put_rejects_other_sessions_record() {
        let (_, store) = setup();
        let owner = RequestIdentity::new("owner").with_lpa("lpa");
        let mut attorney = store.create(&owner, &share(false, false)).await.unwrap();

        let err = store
            .put(&RequestIdentity::new("intruder").with_lpa("lpa"), &mut attorney)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied(_)));

        attorney.mobile = "07700900000".to_string();
        store.put(&owner, &mut attorney).await.unwrap();
        assert_eq!(store.get(&owner).await.unwrap().mobile, "07700900000");
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_pointer() {
        let (mock, store) = setup();
        let identity = RequestIdentity::new("sess").with_lpa("lpa");
        store.create(&identity, &share(false, false)).await.unwrap();

        store.delete(&identity).await.unwrap();

        assert!(mock.is_empty().await);
    }
}
