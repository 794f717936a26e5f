//! Details a certificate provider provides about themselves.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{Address, Language};
use crate::storage::keys::{self, Keys};
use crate::task::certificate_provider::CertificateProviderTasks;

/// Result of an identity check, as reported by the identity-proofing service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IdentityUserData {
    pub confirmed: bool,
    pub first_names: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Certificate {
    pub agree_to_statement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreed_at: Option<DateTime<Utc>>,
}

/// Stored at `LPA#<id>` / `#CERTIFICATE_PROVIDER#<session>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CertificateProviderProvidedDetails {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "UID")]
    pub uid: Uuid,
    #[serde(rename = "LpaID")]
    pub lpa_id: String,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_user_data: Option<IdentityUserData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_language_preference: Option<Language>,
    pub certificate: Certificate,
    /// Share code this record was redeemed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_key: Option<Keys>,
    pub tasks: CertificateProviderTasks,
}

impl CertificateProviderProvidedDetails {
    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    pub fn session_id(&self) -> Option<&str> {
        keys::id_from_key(&self.sk, keys::CERTIFICATE_PROVIDER_PREFIX)
    }

    pub fn identity_confirmed(&self) -> bool {
        self.identity_user_data
            .as_ref()
            .is_some_and(|data| data.confirmed)
    }
}
