//! Share code records.

use std::sync::Arc;

use super::Result;
use crate::actor::{ActorType, ShareCodeData};
use crate::storage::keys::{self, Keys};
use crate::storage::{Item, RecordStore};

pub struct ShareCodeStore {
    store: Arc<dyn RecordStore>,
}

impl ShareCodeStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Look up a code under the partition for `actor_type`.
    pub async fn get(&self, actor_type: ActorType, code: &str) -> Result<ShareCodeData> {
        let keys = keys::share_code_keys(actor_type, code)?;
        self.get_by_keys(&keys).await
    }

    pub async fn get_by_keys(&self, keys: &Keys) -> Result<ShareCodeData> {
        Ok(self.store.get(keys).await?.decode()?)
    }

    /// Store `data` under the keys for `(actor_type, code)`, overwriting any
    /// existing code.
    pub async fn put(
        &self,
        actor_type: ActorType,
        code: &str,
        data: &mut ShareCodeData,
    ) -> Result<()> {
        let keys = keys::share_code_keys(actor_type, code)?;
        data.pk = keys.pk.clone();
        data.sk = keys.sk.clone();

        self.store.put(Item::encode(keys, data)?).await?;
        Ok(())
    }

    /// Claim a code for `session_id`.
    ///
    /// The claim is a conditional write, so of any number of sessions racing
    /// to redeem one code exactly one wins. Returns whether the claim belongs
    /// to `session_id`; claiming again from the winning session is `true`.
    pub async fn claim(&self, share: &Keys, session_id: &str) -> Result<bool> {
        let keys = keys::redeemed_keys(share);

        match self.store.create(Item::new(keys.clone(), session_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_already_exists() => Ok(self.store.get(&keys).await?.data == session_id),
            Err(e) => Err(e.into()),
        }
    }

    /// Session holding the claim on a code, if any.
    pub async fn claimant(&self, share: &Keys) -> Result<Option<String>> {
        match self.store.get(&keys::redeemed_keys(share)).await {
            Ok(item) => Ok(Some(item.data)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a code along with its claim.
    pub async fn delete(&self, keys: &Keys) -> Result<()> {
        self.store.delete(keys).await?;
        self.store.delete(&keys::redeemed_keys(keys)).await?;
        Ok(())
    }
}
