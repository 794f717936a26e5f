//! In-memory RecordStore for testing and local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_index, single_match, Item, Keys, RecordStore, Result, StorageError};

/// Mock record store that keeps items in memory.
///
/// Items are ordered by `(pk, sk)`, so scans come back in a stable order.
#[derive(Default)]
pub struct MockRecordStore {
    items: RwLock<BTreeMap<(String, String), String>>,
    fail_on_create_prefix: RwLock<Option<String>>,
    fail_on_put: RwLock<bool>,
    fail_on_get: RwLock<bool>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `create` for items whose sort key starts with `prefix`.
    pub async fn set_fail_on_create_prefix(&self, prefix: Option<&str>) {
        *self.fail_on_create_prefix.write().await = prefix.map(str::to_string);
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// Every stored item, ordered by key.
    pub async fn items(&self) -> Vec<Item> {
        self.items
            .read()
            .await
            .iter()
            .map(|((pk, sk), data)| Item {
                pk: pk.clone(),
                sk: sk.clone(),
                data: data.clone(),
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn check_get(&self) -> Result<()> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("get disabled".to_string()));
        }
        Ok(())
    }

    async fn scan<F>(&self, keep: F) -> Vec<Item>
    where
        F: Fn(&str, &str) -> bool,
    {
        self.items
            .read()
            .await
            .iter()
            .filter(|((pk, sk), _)| keep(pk, sk))
            .map(|((pk, sk), data)| Item {
                pk: pk.clone(),
                sk: sk.clone(),
                data: data.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn get(&self, keys: &Keys) -> Result<Item> {
        self.check_get().await?;

        let items = self.items.read().await;
        items
            .get(&(keys.pk.clone(), keys.sk.clone()))
            .map(|data| Item::new(keys.clone(), data.clone()))
            .ok_or_else(|| StorageError::not_found(keys))
    }

    async fn create(&self, item: Item) -> Result<()> {
        if let Some(prefix) = self.fail_on_create_prefix.read().await.as_deref() {
            if item.sk.starts_with(prefix) {
                return Err(StorageError::Unavailable(format!(
                    "create disabled for {}",
                    prefix
                )));
            }
        }

        let mut items = self.items.write().await;
        let key = (item.pk, item.sk);
        if items.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                pk: key.0,
                sk: key.1,
            });
        }

        items.insert(key, item.data);
        Ok(())
    }

    async fn put(&self, item: Item) -> Result<()> {
        if *self.fail_on_put.read().await {
            return Err(StorageError::Unavailable("put disabled".to_string()));
        }

        self.items
            .write()
            .await
            .insert((item.pk, item.sk), item.data);
        Ok(())
    }

    async fn delete(&self, keys: &Keys) -> Result<()> {
        self.items
            .write()
            .await
            .remove(&(keys.pk.clone(), keys.sk.clone()));
        Ok(())
    }

    async fn get_one_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Item> {
        let items = self.get_all_by_partial_sk(pk, sk_prefix).await?;
        single_match(pk, sk_prefix, items)
    }

    async fn get_all_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.check_get().await?;
        Ok(self
            .scan(|item_pk, item_sk| item_pk == pk && item_sk.starts_with(sk_prefix))
            .await)
    }

    async fn get_all_by_gsi(&self, index: &str, sk: &str) -> Result<Vec<Item>> {
        check_index(index)?;
        self.check_get().await?;
        Ok(self.scan(|_, item_sk| item_sk == sk).await)
    }

    async fn get_all_by_keys(&self, keys: &[Keys]) -> Result<Vec<Item>> {
        self.check_get().await?;

        let items = self.items.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| {
                items
                    .get(&(k.pk.clone(), k.sk.clone()))
                    .map(|data| Item::new(k.clone(), data.clone()))
            })
            .collect())
    }
}
