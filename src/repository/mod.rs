//! Actor repositories.
//!
//! One store per actor kind over the shared [`RecordStore`]. Every call takes
//! the caller's [`RequestIdentity`](crate::session::RequestIdentity)
//! explicitly; a store never reads identity from anywhere else.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::actor::{
    AttorneyProvidedDetails, CertificateProviderProvidedDetails, DonorProvidedDetails, LpaLink,
    LpaReference,
};
use crate::storage::{Item, Keys, RecordStore, StorageError};

mod attorney;
mod certificate_provider;
mod dashboard;
mod donor;
mod organisation;
mod share_code;

pub use attorney::AttorneyStore;
pub use certificate_provider::CertificateProviderStore;
pub use dashboard::{DashboardResults, DashboardStore, LpaAndActorTasks};
pub use donor::DonorStore;
pub use organisation::OrganisationStore;
pub use share_code::ShareCodeStore;

/// Every store, built once over one [`RecordStore`] by the composition root.
#[derive(Clone)]
pub struct Repositories {
    pub donors: Arc<DonorStore>,
    pub attorneys: Arc<AttorneyStore>,
    pub certificate_providers: Arc<CertificateProviderStore>,
    pub share_codes: Arc<ShareCodeStore>,
    pub dashboard: Arc<DashboardStore>,
    pub organisations: Arc<OrganisationStore>,
}

impl Repositories {
    pub fn new(store: Arc<dyn RecordStore>, now: crate::utils::clock::Now) -> Self {
        Self {
            donors: Arc::new(DonorStore::new(store.clone(), now.clone())),
            attorneys: Arc::new(AttorneyStore::new(store.clone(), now.clone())),
            certificate_providers: Arc::new(CertificateProviderStore::new(
                store.clone(),
                now.clone(),
            )),
            share_codes: Arc::new(ShareCodeStore::new(store.clone())),
            dashboard: Arc::new(DashboardStore::new(store.clone())),
            organisations: Arc::new(OrganisationStore::new(store, now)),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("session missing")]
    SessionMissing,

    #[error("{operation} requires {required}")]
    MissingSessionData {
        operation: &'static str,
        required: &'static str,
    },

    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The actor record was stored but its sub-index pointer was not.
    #[error("sub-index pointer write failed: {source}")]
    LinkWriteFailed { source: StorageError },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_not_found())
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_already_exists())
    }
}

/// Records listed most recently touched first.
pub(crate) trait Recency {
    fn updated_at(&self) -> DateTime<Utc>;
    fn lpa_id(&self) -> &str;
}

impl Recency for DonorProvidedDetails {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn lpa_id(&self) -> &str {
        &self.lpa_id
    }
}

impl Recency for AttorneyProvidedDetails {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn lpa_id(&self) -> &str {
        &self.lpa_id
    }
}

impl Recency for CertificateProviderProvidedDetails {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn lpa_id(&self) -> &str {
        &self.lpa_id
    }
}

/// `UpdatedAt` descending, ties broken by LPA id so the order is stable.
pub(crate) fn by_recency<T: Recency>(a: &T, b: &T) -> Ordering {
    b.updated_at()
        .cmp(&a.updated_at())
        .then_with(|| a.lpa_id().cmp(b.lpa_id()))
}

/// Write an actor record, then its sub-index pointer.
///
/// The two writes are independent. When the record already exists the
/// pointer write is still attempted, so a retry repairs a pointer lost to an
/// earlier failure; the caller then sees `AlreadyExists`.
pub(crate) async fn create_with_link(
    store: &Arc<dyn RecordStore>,
    record: Item,
    link: &LpaLink,
) -> Result<()> {
    let keys = record.keys();
    let existed = match store.create(record).await {
        Ok(()) => false,
        Err(e) if e.is_already_exists() => true,
        Err(e) => return Err(e.into()),
    };

    match store.create(link.to_item()).await {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {}
        Err(source) => {
            warn!(
                pk = %link.pk,
                sk = %link.sk,
                error = %source,
                "Actor record stored without sub-index pointer"
            );
            return Err(Error::LinkWriteFailed { source });
        }
    }

    if existed {
        return Err(Error::Storage(StorageError::AlreadyExists {
            pk: keys.pk,
            sk: keys.sk,
        }));
    }
    Ok(())
}

/// Decode an LPA record, following a donor reference to the
/// organisation-owned record it points at.
pub(crate) async fn resolve_lpa(
    store: &Arc<dyn RecordStore>,
    item: Item,
) -> Result<DonorProvidedDetails> {
    match item.decode::<LpaReference>() {
        Ok(reference) if !reference.referenced_sk.is_empty() => {
            let item = store
                .get(&Keys::new(reference.pk, reference.referenced_sk))
                .await?;
            Ok(item.decode()?)
        }
        _ => Ok(item.decode()?),
    }
}
