//! Partition and sort key construction for the single-table layout.
//!
//! Every record lives under a `(PK, SK)` pair. LPA-scoped records share the
//! `LPA#<id>` partition and are told apart by their sort key prefix; share
//! codes and organisations get partitions of their own.
//!
//! | Record | PK | SK |
//! |---|---|---|
//! | LPA (donor owned) | `LPA#<lpa>` | `#DONOR#<session>` |
//! | LPA (organisation owned) | `LPA#<lpa>` | `#ORGANISATION#<org>` |
//! | Attorney details | `LPA#<lpa>` | `#ATTORNEY#<session>` |
//! | Certificate provider details | `LPA#<lpa>` | `#CERTIFICATE_PROVIDER#<session>` |
//! | Sub-index pointer | `LPA#<lpa>` | `#SUB#<session>` |
//! | Share code | `<PREFIX>SHARE#<code>` | `#METADATA#<code>` |
//! | Share code claim | `<PREFIX>SHARE#<code>` | `#REDEEMED#<code>` |
//! | Organisation | `ORGANISATION#<org>` | `#ORGANISATION#<org>` |
//! | Member | `ORGANISATION#<org>` | `#MEMBER#<session>` |
//! | Member invite | `ORGANISATION#<org>` | `#MEMBERINVITE#<base64 email>` |

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{Result, StorageError};
use crate::actor::ActorType;

/// Name of the secondary index keyed by `(SK, Data)`.
pub const ACTOR_INDEX: &str = "ActorIndex";

pub const LPA_PREFIX: &str = "LPA#";
pub const DONOR_PREFIX: &str = "#DONOR#";
pub const ATTORNEY_PREFIX: &str = "#ATTORNEY#";
pub const CERTIFICATE_PROVIDER_PREFIX: &str = "#CERTIFICATE_PROVIDER#";
pub const SUB_PREFIX: &str = "#SUB#";
pub const METADATA_PREFIX: &str = "#METADATA#";
pub const REDEEMED_PREFIX: &str = "#REDEEMED#";
pub const ORGANISATION_PK_PREFIX: &str = "ORGANISATION#";
pub const ORGANISATION_PREFIX: &str = "#ORGANISATION#";
pub const MEMBER_PREFIX: &str = "#MEMBER#";
pub const MEMBER_INVITE_PREFIX: &str = "#MEMBERINVITE#";

/// A primary key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Keys {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
}

impl Keys {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// Keys for an attorney record plus the sort key of its sub-index pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttorneyKeys {
    pub pk: String,
    pub sk: String,
    pub sub_sk: String,
}

impl AttorneyKeys {
    pub fn record(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    pub fn sub(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sub_sk.clone())
    }
}

pub fn lpa_key(lpa_id: &str) -> String {
    format!("{LPA_PREFIX}{lpa_id}")
}

pub fn donor_key(session_id: &str) -> String {
    format!("{DONOR_PREFIX}{session_id}")
}

pub fn attorney_key(session_id: &str) -> String {
    format!("{ATTORNEY_PREFIX}{session_id}")
}

pub fn certificate_provider_key(session_id: &str) -> String {
    format!("{CERTIFICATE_PROVIDER_PREFIX}{session_id}")
}

pub fn sub_key(session_id: &str) -> String {
    format!("{SUB_PREFIX}{session_id}")
}

pub fn metadata_key(code: &str) -> String {
    format!("{METADATA_PREFIX}{code}")
}

pub fn organisation_pk(organisation_id: &str) -> String {
    format!("{ORGANISATION_PK_PREFIX}{organisation_id}")
}

/// Sort key of the organisation record, also used as the owner key of
/// organisation-created LPAs.
pub fn organisation_key(organisation_id: &str) -> String {
    format!("{ORGANISATION_PREFIX}{organisation_id}")
}

pub fn member_key(session_id: &str) -> String {
    format!("{MEMBER_PREFIX}{session_id}")
}

pub fn member_invite_key(email: &str) -> String {
    format!("{MEMBER_INVITE_PREFIX}{}", STANDARD.encode(email))
}

pub fn donor_keys(lpa_id: &str, session_id: &str) -> Keys {
    Keys::new(lpa_key(lpa_id), donor_key(session_id))
}

pub fn attorney_keys(lpa_id: &str, session_id: &str) -> AttorneyKeys {
    AttorneyKeys {
        pk: lpa_key(lpa_id),
        sk: attorney_key(session_id),
        sub_sk: sub_key(session_id),
    }
}

pub fn certificate_provider_keys(lpa_id: &str, session_id: &str) -> Keys {
    Keys::new(lpa_key(lpa_id), certificate_provider_key(session_id))
}

pub fn sub_keys(lpa_id: &str, session_id: &str) -> Keys {
    Keys::new(lpa_key(lpa_id), sub_key(session_id))
}

/// Keys for a share code. Attorney kinds share one partition prefix since the
/// landing page alone cannot tell them apart.
pub fn share_code_keys(actor_type: ActorType, code: &str) -> Result<Keys> {
    let prefix = actor_type
        .share_prefix()
        .ok_or(StorageError::UnsupportedActorType(actor_type))?;

    Ok(Keys::new(
        format!("{prefix}SHARE#{code}"),
        metadata_key(code),
    ))
}

/// Keys of the claim item that records which session redeemed a share code.
/// It shares the code's partition so deleting the code can remove it too.
pub fn redeemed_keys(share: &Keys) -> Keys {
    let code = share.sk.strip_prefix(METADATA_PREFIX).unwrap_or(&share.sk);
    Keys::new(share.pk.clone(), format!("{REDEEMED_PREFIX}{code}"))
}

pub fn organisation_keys(organisation_id: &str) -> Keys {
    Keys::new(
        organisation_pk(organisation_id),
        organisation_key(organisation_id),
    )
}

pub fn member_keys(organisation_id: &str, session_id: &str) -> Keys {
    Keys::new(organisation_pk(organisation_id), member_key(session_id))
}

/// Strip a known prefix from a key, returning the id it carries.
pub fn id_from_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix).filter(|id| !id.is_empty())
}
