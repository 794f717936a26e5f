//! Supporter organisations, their members and LPAs.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{by_recency, Error, Result};
use crate::actor::{DonorProvidedDetails, Member, MemberInvite, Organisation, Permission};
use crate::session::RequestIdentity;
use crate::storage::keys::{self, Keys};
use crate::storage::{Item, RecordStore, ACTOR_INDEX};
use crate::utils::clock::Now;

pub struct OrganisationStore {
    store: Arc<dyn RecordStore>,
    now: Now,
}

impl OrganisationStore {
    pub fn new(store: Arc<dyn RecordStore>, now: Now) -> Self {
        Self { store, now }
    }

    /// Create an organisation with the caller as its first admin.
    pub async fn create(&self, identity: &RequestIdentity, name: &str) -> Result<Organisation> {
        let session_id = identity.session()?;
        let now = (self.now)();
        let id = Uuid::new_v4().to_string();

        let keys = keys::organisation_keys(&id);
        let organisation = Organisation {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
            id: id.clone(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.create(Item::encode(keys, &organisation)?).await?;

        let member_keys = keys::member_keys(&id, session_id);
        let member = Member {
            pk: member_keys.pk.clone(),
            sk: member_keys.sk.clone(),
            id: Uuid::new_v4(),
            organisation_id: id.clone(),
            email: identity.email.clone(),
            permission: Permission::Admin,
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        self.store.create(Item::encode(member_keys, &member)?).await?;

        info!(organisation_id = %id, "Created organisation");
        Ok(organisation)
    }

    pub async fn get(&self, identity: &RequestIdentity) -> Result<Organisation> {
        let organisation_id = identity.organisation("organisation_store.get")?;
        let item = self
            .store
            .get(&keys::organisation_keys(organisation_id))
            .await?;
        Ok(item.decode()?)
    }

    /// The membership held by the caller's session, found through the
    /// ActorIndex since the organisation id is not yet known at login.
    pub async fn member_for_session(&self, identity: &RequestIdentity) -> Result<Member> {
        let session_id = identity.session()?;
        let mut items = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::member_key(session_id))
            .await?;

        match items.len() {
            0 => Err(crate::storage::StorageError::NotFound {
                pk: keys::ORGANISATION_PK_PREFIX.to_string(),
                sk: keys::member_key(session_id),
            }
            .into()),
            _ => Ok(items.remove(0).decode()?),
        }
    }

    /// Invite someone to join the caller's organisation. Keys, organisation
    /// fields and the creation time are filled in here.
    pub async fn create_member_invite(
        &self,
        identity: &RequestIdentity,
        organisation: &Organisation,
        mut invite: MemberInvite,
    ) -> Result<MemberInvite> {
        let organisation_id = identity.organisation("organisation_store.create_member_invite")?;
        if organisation.id != organisation_id {
            return Err(Error::AccessDenied(format!(
                "caller is not a member of organisation {}",
                organisation.id
            )));
        }

        invite.pk = keys::organisation_pk(organisation_id);
        invite.sk = keys::member_invite_key(&invite.email);
        invite.organisation_id = organisation.id.clone();
        invite.organisation_name = organisation.name.clone();
        invite.created_at = (self.now)();

        self.store.create(Item::encode(Keys::new(&invite.pk, &invite.sk), &invite)?).await?;
        Ok(invite)
    }

    pub async fn member_invites(&self, identity: &RequestIdentity) -> Result<Vec<MemberInvite>> {
        let organisation_id = identity.organisation("organisation_store.member_invites")?;
        self.store
            .get_all_by_partial_sk(
                &keys::organisation_pk(organisation_id),
                keys::MEMBER_INVITE_PREFIX,
            )
            .await?
            .iter()
            .map(|item| Ok(item.decode()?))
            .collect()
    }

    /// Start an LPA owned by the caller's organisation.
    pub async fn create_lpa(&self, identity: &RequestIdentity) -> Result<DonorProvidedDetails> {
        let organisation_id = identity.organisation("organisation_store.create_lpa")?;
        let lpa_id = Uuid::new_v4().to_string();
        let now = (self.now)();

        let keys = Keys::new(keys::lpa_key(&lpa_id), keys::organisation_key(organisation_id));
        let mut lpa = DonorProvidedDetails {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
            lpa_id: lpa_id.clone(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        lpa.donor.uid = Uuid::new_v4();

        self.store.create(Item::encode(keys, &lpa)?).await?;

        info!(lpa_id = %lpa_id, organisation_id = %organisation_id, "Created organisation LPA");
        Ok(lpa)
    }

    /// LPAs owned by the caller's organisation, most recently updated first.
    pub async fn lpas(&self, identity: &RequestIdentity) -> Result<Vec<DonorProvidedDetails>> {
        let organisation_id = identity.organisation("organisation_store.lpas")?;
        let mut lpas = self
            .store
            .get_all_by_gsi(ACTOR_INDEX, &keys::organisation_key(organisation_id))
            .await?
            .iter()
            .filter(|item| item.pk.starts_with(keys::LPA_PREFIX))
            .map(Item::decode)
            .collect::<crate::storage::Result<Vec<DonorProvidedDetails>>>()?;

        lpas.sort_by(by_recency);
        Ok(lpas)
    }
}
