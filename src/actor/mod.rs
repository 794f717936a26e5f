//! Actor types and the records each actor owns.

mod actor_type;
pub mod attorney;
pub mod certificate_provider;
pub mod common;
pub mod donor;
pub mod link;
pub mod organisation;
pub mod share_code;

pub use actor_type::{ActorKind, ActorType, UnknownActorType};
pub use attorney::{AttorneyProvidedDetails, TrustCorporationSignatory};
pub use certificate_provider::{Certificate, CertificateProviderProvidedDetails, IdentityUserData};
pub use common::{Address, Language};
pub use donor::{DonorProvidedDetails, LpaReference, LpaType};
pub use link::LpaLink;
pub use organisation::{Member, MemberInvite, Organisation, Permission};
pub use share_code::ShareCodeData;
