//! The closed set of actor types and the static facts attached to each.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role bucket an actor type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Donor,
    Attorney,
    CertificateProvider,
    Supporter,
}

/// Every party that can be bound to an LPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    Donor,
    Attorney,
    ReplacementAttorney,
    CertificateProvider,
    TrustCorporation,
    ReplacementTrustCorporation,
    Supporter,
}

struct ActorTypeInfo {
    tag: &'static str,
    kind: ActorKind,
    share_prefix: Option<&'static str>,
    start_path: &'static str,
}

// Indexed by discriminant; order must follow the enum.
static ACTOR_TYPES: [ActorTypeInfo; 7] = [
    ActorTypeInfo {
        tag: "DONOR",
        kind: ActorKind::Donor,
        share_prefix: Some("DONOR"),
        start_path: "/start",
    },
    ActorTypeInfo {
        tag: "ATTORNEY",
        kind: ActorKind::Attorney,
        share_prefix: Some("ATTORNEY"),
        start_path: "/attorney-start",
    },
    ActorTypeInfo {
        tag: "REPLACEMENT_ATTORNEY",
        kind: ActorKind::Attorney,
        share_prefix: Some("ATTORNEY"),
        start_path: "/attorney-start",
    },
    ActorTypeInfo {
        tag: "CERTIFICATE_PROVIDER",
        kind: ActorKind::CertificateProvider,
        share_prefix: Some("CERTIFICATEPROVIDER"),
        start_path: "/certificate-provider-start",
    },
    ActorTypeInfo {
        tag: "TRUST_CORPORATION",
        kind: ActorKind::Attorney,
        share_prefix: Some("ATTORNEY"),
        start_path: "/attorney-start",
    },
    ActorTypeInfo {
        tag: "REPLACEMENT_TRUST_CORPORATION",
        kind: ActorKind::Attorney,
        share_prefix: Some("ATTORNEY"),
        start_path: "/attorney-start",
    },
    ActorTypeInfo {
        tag: "SUPPORTER",
        kind: ActorKind::Supporter,
        share_prefix: None,
        start_path: "/supporter-start",
    },
];

impl ActorType {
    pub const ALL: [ActorType; 7] = [
        ActorType::Donor,
        ActorType::Attorney,
        ActorType::ReplacementAttorney,
        ActorType::CertificateProvider,
        ActorType::TrustCorporation,
        ActorType::ReplacementTrustCorporation,
        ActorType::Supporter,
    ];

    fn info(self) -> &'static ActorTypeInfo {
        &ACTOR_TYPES[self as usize]
    }

    /// Select one of the four attorney labels from a record's flags.
    pub fn attorney(is_replacement: bool, is_trust_corporation: bool) -> Self {
        match (is_replacement, is_trust_corporation) {
            (false, false) => ActorType::Attorney,
            (true, false) => ActorType::ReplacementAttorney,
            (false, true) => ActorType::TrustCorporation,
            (true, true) => ActorType::ReplacementTrustCorporation,
        }
    }

    /// Tag used in pointer strings and logs, e.g. `ATTORNEY`.
    pub fn as_str(self) -> &'static str {
        self.info().tag
    }

    pub fn kind(self) -> ActorKind {
        self.info().kind
    }

    /// Partition key prefix of this type's share codes, if it has any.
    pub fn share_prefix(self) -> Option<&'static str> {
        self.info().share_prefix
    }

    /// Where an unauthenticated caller for this role is sent.
    pub fn start_path(self) -> &'static str {
        self.info().start_path
    }

    pub fn is_attorney(self) -> bool {
        self.kind() == ActorKind::Attorney
    }

    pub fn is_replacement(self) -> bool {
        matches!(
            self,
            ActorType::ReplacementAttorney | ActorType::ReplacementTrustCorporation
        )
    }

    pub fn is_trust_corporation(self) -> bool {
        matches!(
            self,
            ActorType::TrustCorporation | ActorType::ReplacementTrustCorporation
        )
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown actor type: {0}")]
pub struct UnknownActorType(pub String);

impl FromStr for ActorType {
    type Err = UnknownActorType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActorType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownActorType(s.to_string()))
    }
}
