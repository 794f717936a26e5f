//! Invitation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ActorType;
use crate::storage::keys::{self, Keys};

/// Stored at `<PREFIX>SHARE#<code>` / `#METADATA#<code>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShareCodeData {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    /// Partition key of the LPA, `LPA#<id>`.
    pub lpa_key: String,
    /// Sort key of the LPA record owner.
    pub lpa_owner_key: String,
    #[serde(rename = "ActorUID")]
    pub actor_uid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,
    /// Session of whoever issued the code.
    #[serde(rename = "SessionID")]
    pub session_id: String,
    #[serde(rename = "OrganisationID", skip_serializing_if = "String::is_empty")]
    pub organisation_id: String,
    pub is_replacement_attorney: bool,
    pub is_trust_corporation: bool,
    pub invitee_email: String,
    /// Session that redeemed the code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShareCodeData {
    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    pub fn lpa_id(&self) -> Option<&str> {
        keys::id_from_key(&self.lpa_key, keys::LPA_PREFIX)
    }

    /// Actor type the code binds. Attorney codes share one prefix, so the
    /// stored flags pick the precise label.
    pub fn resolved_actor_type(&self, landing: ActorType) -> ActorType {
        let actor_type = self.actor_type.unwrap_or(landing);
        if actor_type.is_attorney() {
            ActorType::attorney(self.is_replacement_attorney, self.is_trust_corporation)
        } else {
            actor_type
        }
    }

    pub fn redeemed_by_other(&self, session_id: &str) -> bool {
        self.redeemed_by
            .as_deref()
            .is_some_and(|redeemer| redeemer != session_id)
    }
}
