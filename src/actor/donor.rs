//! The LPA record, owned by the donor.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::Address;
use super::ActorType;
use crate::storage::keys::{self, Keys};
use crate::task::donor::DonorTasks;
use crate::task::PaymentState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LpaType {
    #[default]
    PropertyAndAffairs,
    PersonalWelfare,
}

impl LpaType {
    pub fn as_str(self) -> &'static str {
        match self {
            LpaType::PropertyAndAffairs => "property-and-affairs",
            LpaType::PersonalWelfare => "personal-welfare",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Donor {
    #[serde(rename = "UID")]
    pub uid: Uuid,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Address,
}

impl Donor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Attorney {
    #[serde(rename = "UID")]
    pub uid: Uuid,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub address: Address,
}

impl Attorney {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrustCorporation {
    #[serde(rename = "UID")]
    pub uid: Uuid,
    pub name: String,
    pub company_number: String,
    pub email: String,
    pub address: Address,
}

/// Attorneys appointed in one capacity, original or replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Attorneys {
    pub attorneys: Vec<Attorney>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_corporation: Option<TrustCorporation>,
}

impl Attorneys {
    pub fn get(&self, uid: Uuid) -> Option<&Attorney> {
        self.attorneys.iter().find(|a| a.uid == uid)
    }

    pub fn len(&self) -> usize {
        self.attorneys.len() + usize::from(self.trust_corporation.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the attorney or trust corporation with this UID.
    pub fn remove(&mut self, uid: Uuid) -> bool {
        if self
            .trust_corporation
            .as_ref()
            .is_some_and(|tc| tc.uid == uid)
        {
            self.trust_corporation = None;
            return true;
        }

        let before = self.attorneys.len();
        self.attorneys.retain(|a| a.uid != uid);
        self.attorneys.len() != before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CertificateProvider {
    #[serde(rename = "UID")]
    pub uid: Uuid,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
}

impl CertificateProvider {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_name)
    }
}

/// The LPA record.
///
/// Stored at `LPA#<id>` under the owner's sort key: `#DONOR#<session>` when a
/// donor created it, `#ORGANISATION#<id>` when a supporter did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DonorProvidedDetails {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "LpaID")]
    pub lpa_id: String,
    #[serde(rename = "LpaUID")]
    pub lpa_uid: String,
    #[serde(rename = "Type")]
    pub lpa_type: LpaType,
    pub donor: Donor,
    pub attorneys: Attorneys,
    pub replacement_attorneys: Attorneys,
    pub certificate_provider: CertificateProvider,
    pub tasks: DonorTasks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_provider_signed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonorProvidedDetails {
    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }

    /// Sort key of the record owner, recorded in share codes and pointers.
    pub fn owner_key(&self) -> &str {
        &self.sk
    }

    pub fn is_organisation_owned(&self) -> bool {
        self.sk.starts_with(keys::ORGANISATION_PREFIX)
    }

    pub fn signed(&self) -> bool {
        self.signed_at.is_some()
    }

    pub fn certificate_provider_signed(&self) -> bool {
        self.certificate_provider_signed_at.is_some()
    }

    pub fn paid(&self) -> bool {
        self.tasks.pay_for_lpa == PaymentState::Completed
    }

    /// Remove an invited actor from the LPA, returning whether anything changed.
    ///
    /// Attorney types are matched by UID in the matching list; the certificate
    /// provider is cleared wholesale and its task reset.
    pub fn remove_actor(&mut self, actor_type: ActorType, uid: Uuid) -> bool {
        match actor_type {
            ActorType::Attorney | ActorType::TrustCorporation => self.attorneys.remove(uid),
            ActorType::ReplacementAttorney | ActorType::ReplacementTrustCorporation => {
                self.replacement_attorneys.remove(uid)
            }
            ActorType::CertificateProvider => {
                self.certificate_provider = CertificateProvider::default();
                self.tasks.certificate_provider = Default::default();
                true
            }
            ActorType::Donor | ActorType::Supporter => false,
        }
    }
}

/// Pointer left at `LPA#<id>` / `#DONOR#<session>` when a donor links to an
/// organisation-created LPA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpaReference {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "ReferencedSK")]
    pub referenced_sk: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    fn attorney(uid: Uuid) -> Attorney {
        Attorney {
            uid,
            first_names: "Jo".to_string(),
            last_name: "Smith".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_remove_actor_attorney_lists() {
        let a = Uuid::new_v4();
        let r = Uuid::new_v4();
        let tc = Uuid::new_v4();
        let mut lpa = DonorProvidedDetails {
            attorneys: Attorneys {
                attorneys: vec![attorney(a)],
                trust_corporation: Some(TrustCorporation {
                    uid: tc,
                    ..Default::default()
                }),
            },
            replacement_attorneys: Attorneys {
                attorneys: vec![attorney(r)],
                trust_corporation: None,
            },
            ..Default::default()
        };

        assert!(!lpa.remove_actor(ActorType::Attorney, r));
        assert!(lpa.remove_actor(ActorType::ReplacementAttorney, r));
        assert!(lpa.replacement_attorneys.is_empty());
        assert!(lpa.remove_actor(ActorType::TrustCorporation, tc));
        assert!(lpa.attorneys.trust_corporation.is_none());
        assert_eq!(lpa.attorneys.len(), 1);
        assert!(lpa.remove_actor(ActorType::Attorney, a));
        assert!(lpa.attorneys.is_empty());
    }

    #[test]
    fn test_remove_actor_certificate_provider_resets_task() {
        let mut lpa = DonorProvidedDetails::default();
        lpa.certificate_provider.first_names = "Cee".to_string();
        lpa.tasks.certificate_provider = TaskState::Completed;

        assert!(lpa.remove_actor(ActorType::CertificateProvider, Uuid::nil()));
        assert_eq!(lpa.certificate_provider, CertificateProvider::default());
        assert_eq!(lpa.tasks.certificate_provider, TaskState::NotStarted);
    }

    #[test]
    fn test_serialized_attribute_names() {
        let lpa = DonorProvidedDetails {
            pk: "LPA#1".to_string(),
            sk: "#DONOR#a".to_string(),
            lpa_id: "1".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&lpa).unwrap();
        assert_eq!(value["PK"], "LPA#1");
        assert_eq!(value["SK"], "#DONOR#a");
        assert_eq!(value["LpaID"], "1");
        assert!(value.get("SignedAt").is_none());
    }
}
