//! Sub-index pointer records.
//!
//! A pointer lives at `LPA#<id>` / `#SUB#<session>` and carries
//! `"<ownerKey>|<ACTORTYPE>"` in its `Data` attribute. It exists only so the
//! ActorIndex can answer "which LPAs is this session party to, and as what".

use super::ActorType;
use crate::storage::keys::{self, Keys};
use crate::storage::{Item, Result, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpaLink {
    pub pk: String,
    pub sk: String,
    /// Sort key of the LPA record owner, e.g. `#DONOR#<session>`.
    pub owner_key: String,
    pub actor_type: ActorType,
}

impl LpaLink {
    pub fn new(lpa_id: &str, session_id: &str, owner_key: &str, actor_type: ActorType) -> Self {
        let keys = keys::sub_keys(lpa_id, session_id);
        Self {
            pk: keys.pk,
            sk: keys.sk,
            owner_key: owner_key.to_string(),
            actor_type,
        }
    }

    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    /// Keys of the LPA record this pointer refers to.
    pub fn lpa_keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.owner_key.clone())
    }

    pub fn lpa_id(&self) -> Option<&str> {
        keys::id_from_key(&self.pk, keys::LPA_PREFIX)
    }

    pub fn pointer(&self) -> String {
        format!("{}|{}", self.owner_key, self.actor_type)
    }

    pub fn to_item(&self) -> Item {
        Item::new(self.keys(), self.pointer())
    }

    pub fn from_item(item: &Item) -> Result<Self> {
        let malformed = || StorageError::MalformedPointer(item.data.clone());

        let (owner_key, tag) = item.data.rsplit_once('|').ok_or_else(malformed)?;
        let actor_type = tag.parse::<ActorType>().map_err(|_| malformed())?;
        if owner_key.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            pk: item.pk.clone(),
            sk: item.sk.clone(),
            owner_key: owner_key.to_string(),
            actor_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_format() {
        let link = LpaLink::new("123", "sess", "#DONOR#donor", ActorType::Attorney);
        let item = link.to_item();

        assert_eq!(item.pk, "LPA#123");
        assert_eq!(item.sk, "#SUB#sess");
        assert_eq!(item.data, "#DONOR#donor|ATTORNEY");
        assert_eq!(LpaLink::from_item(&item).unwrap(), link);
        assert_eq!(link.lpa_keys(), Keys::new("LPA#123", "#DONOR#donor"));
        assert_eq!(link.lpa_id(), Some("123"));
    }

    #[test]
    fn test_malformed_pointers() {
        for data in ["#DONOR#x", "#DONOR#x|NOPE", "|ATTORNEY", "{}"] {
            let item = Item::new(Keys::new("LPA#1", "#SUB#s"), data);
            assert!(
                matches!(LpaLink::from_item(&item), Err(StorageError::MalformedPointer(_))),
                "{data} should be rejected"
            );
        }
    }
}
