//! Storage implementations.
//!
//! One logical table keyed by `(PK, SK)` with a single secondary index,
//! [`keys::ACTOR_INDEX`], keyed by `(SK, Data)`. Every backend stores the
//! same three attributes per item, so heterogeneous records share the table.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::actor::ActorType;
use crate::config::{StorageConfig, StorageType};

pub mod keys;
pub mod mock;

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub use keys::{Keys, ACTOR_INDEX};
pub use mock::MockRecordStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoRecordStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Item not found: pk={pk}, sk={sk}")]
    NotFound { pk: String, sk: String },

    #[error("Conditional check failed: pk={pk}, sk={sk} already exists")]
    AlreadyExists { pk: String, sk: String },

    #[error("Expected one item for pk={pk} with sk prefix {prefix}, found {count}")]
    MultipleResults {
        pk: String,
        prefix: String,
        count: usize,
    },

    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("unsupported actor type: {0}")]
    UnsupportedActorType(ActorType),

    #[error("Malformed pointer: {0}")]
    MalformedPointer(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "dynamo")]
    #[error("DynamoDB error: {0}")]
    Dynamo(String),
}

impl StorageError {
    pub fn not_found(keys: &Keys) -> Self {
        Self::NotFound {
            pk: keys.pk.clone(),
            sk: keys.sk.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// A stored item: primary key plus the `Data` attribute.
///
/// `data` holds the JSON document of a record, or the raw pointer string for
/// sub-index records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub pk: String,
    pub sk: String,
    pub data: String,
}

impl Item {
    pub fn new(keys: Keys, data: impl Into<String>) -> Self {
        Self {
            pk: keys.pk,
            sk: keys.sk,
            data: data.into(),
        }
    }

    /// Serialize a record into an item under the given keys.
    pub fn encode<T: Serialize>(keys: Keys, record: &T) -> Result<Self> {
        Ok(Self::new(keys, serde_json::to_string(record)?))
    }

    /// Deserialize the item's data as a record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.data)?)
    }

    pub fn keys(&self) -> Keys {
        Keys::new(self.pk.clone(), self.sk.clone())
    }
}

/// Generic access to the single table.
///
/// Implementations:
/// - `MockRecordStore`: in-memory, for tests and local runs
/// - `SqliteRecordStore`: SQLite via sqlx
/// - `DynamoRecordStore`: DynamoDB
///
/// No operation retries internally; backend failures are returned as is.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point read. Fails with `NotFound` when absent.
    async fn get(&self, keys: &Keys) -> Result<Item>;

    /// Conditional write. Fails with `AlreadyExists` when `(pk, sk)` is taken.
    async fn create(&self, item: Item) -> Result<()>;

    /// Unconditional upsert.
    async fn put(&self, item: Item) -> Result<()>;

    /// Delete an item. Deleting a missing item succeeds.
    async fn delete(&self, keys: &Keys) -> Result<()>;

    /// Exactly one item in `pk` whose sort key starts with `sk_prefix`.
    async fn get_one_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Item>;

    /// Every item in `pk` whose sort key starts with `sk_prefix`.
    async fn get_all_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>>;

    /// Reverse lookup: every item whose sort key equals `sk` on the named index.
    async fn get_all_by_gsi(&self, index: &str, sk: &str) -> Result<Vec<Item>>;

    /// Batch point read. Keys that do not exist are omitted from the result.
    async fn get_all_by_keys(&self, keys: &[Keys]) -> Result<Vec<Item>>;
}

/// Reject index names other than the one the table defines.
pub(crate) fn check_index(index: &str) -> Result<()> {
    if index == ACTOR_INDEX {
        Ok(())
    } else {
        Err(StorageError::UnknownIndex(index.to_string()))
    }
}

/// Pick the single match for a partial sort key query.
pub(crate) fn single_match(pk: &str, sk_prefix: &str, mut items: Vec<Item>) -> Result<Item> {
    match items.len() {
        0 => Err(StorageError::NotFound {
            pk: pk.to_string(),
            sk: sk_prefix.to_string(),
        }),
        1 => Ok(items.remove(0)),
        count => Err(StorageError::MultipleResults {
            pk: pk.to_string(),
            prefix: sk_prefix.to_string(),
            count,
        }),
    }
}

/// Initialize storage based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn RecordStore>, Box<dyn std::error::Error + Send + Sync>> {
    info!("Storage: {}", config.storage_type);

    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(MockRecordStore::new())),
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.sqlite.path))
                    .await?;

            let store = SqliteRecordStore::new(pool);
            store.init().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        #[cfg(feature = "dynamo")]
        StorageType::Dynamo => {
            let store = DynamoRecordStore::new(
                config.dynamo.table_name.clone(),
                config.dynamo.endpoint_url.as_deref(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StorageType::Dynamo => {
            tracing::error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err("DynamoDB feature not enabled".into())
        }
    }
}
