//! Details an attorney or trust corporation provides about themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::Language;
use super::ActorType;
use crate::storage::keys::{self, Keys};
use crate::task::attorney::AttorneyTasks;

/// One of the two people allowed to sign for a trust corporation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrustCorporationSignatory {
    pub first_names: String,
    pub last_name: String,
    pub professional_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

impl TrustCorporationSignatory {
    pub fn signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Stored at `LPA#<id>` / `#ATTORNEY#<session>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AttorneyProvidedDetails {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "UID")]
    pub uid: Uuid,
    #[serde(rename = "LpaID")]
    pub lpa_id: String,
    pub updated_at: DateTime<Utc>,
    pub is_replacement: bool,
    pub is_trust_corporation: bool,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_language_preference: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    pub would_like_second_signatory: bool,
    pub authorised_signatories: [TrustCorporationSignatory; 2],
    /// Share code this record was redeemed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_key: Option<Keys>,
    pub tasks: AttorneyTasks,
}

impl AttorneyProvidedDetails {
    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    pub fn actor_type(&self) -> ActorType {
        ActorType::attorney(self.is_replacement, self.is_trust_corporation)
    }

    /// Session id embedded in the sort key.
    pub fn session_id(&self) -> Option<&str> {
        keys::id_from_key(&self.sk, keys::ATTORNEY_PREFIX)
    }

    /// A trust corporation has signed once its first signatory has, and the
    /// second too when one was asked for.
    pub fn signed(&self) -> bool {
        if self.is_trust_corporation {
            let [first, second] = &self.authorised_signatories;
            first.signed() && (!self.would_like_second_signatory || second.signed())
        } else {
            self.signed_at.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_individual() {
        let mut attorney = AttorneyProvidedDetails::default();
        assert!(!attorney.signed());
        attorney.signed_at = Some(Utc::now());
        assert!(attorney.signed());
    }

    #[test]
    fn test_signed_trust_corporation() {
        let mut attorney = AttorneyProvidedDetails {
            is_trust_corporation: true,
            signed_at: Some(Utc::now()),
            ..Default::default()
        };
        assert!(!attorney.signed());

        attorney.authorised_signatories[0].signed_at = Some(Utc::now());
        assert!(attorney.signed());

        attorney.would_like_second_signatory = true;
        assert!(!attorney.signed());

        attorney.authorised_signatories[1].signed_at = Some(Utc::now());
        assert!(attorney.signed());
    }

    #[test]
    fn test_session_id_from_sort_key() {
        let attorney = AttorneyProvidedDetails {
            sk: "#ATTORNEY#c2Vzcw==".to_string(),
            ..Default::default()
        };
        assert_eq!(attorney.session_id(), Some("c2Vzcw=="));
    }
}
