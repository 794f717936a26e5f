//! DynamoDB RecordStore implementation.
//!
//! Table schema:
//! - PK: partition key (String)
//! - SK: sort key (String)
//! - Data: record JSON or pointer string (String)
//! - ActorIndex: global secondary index with hash key SK, range key Data

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::storage::{
    check_index, single_match, Item, Keys, RecordStore, Result, StorageError, ACTOR_INDEX,
};

const ATTR_PK: &str = "PK";
const ATTR_SK: &str = "SK";
const ATTR_DATA: &str = "Data";

/// DynamoDB limit on keys per BatchGetItem request.
const BATCH_GET_LIMIT: usize = 100;

type AttributeMap = HashMap<String, AttributeValue>;

/// DynamoDB implementation of RecordStore.
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoRecordStore {
    /// Create a new DynamoDB record store.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for records");

        Ok(Self { client, table_name })
    }

    fn key_map(keys: &Keys) -> AttributeMap {
        HashMap::from([
            (ATTR_PK.to_string(), AttributeValue::S(keys.pk.clone())),
            (ATTR_SK.to_string(), AttributeValue::S(keys.sk.clone())),
        ])
    }

    fn item_map(item: Item) -> AttributeMap {
        HashMap::from([
            (ATTR_PK.to_string(), AttributeValue::S(item.pk)),
            (ATTR_SK.to_string(), AttributeValue::S(item.sk)),
            (ATTR_DATA.to_string(), AttributeValue::S(item.data)),
        ])
    }

    fn string_attr(map: &AttributeMap, name: &str) -> Result<String> {
        match map.get(name) {
            Some(AttributeValue::S(value)) => Ok(value.clone()),
            _ => Err(StorageError::Dynamo(format!(
                "item is missing string attribute {}",
                name
            ))),
        }
    }

    fn to_item(map: &AttributeMap) -> Result<Item> {
        Ok(Item {
            pk: Self::string_attr(map, ATTR_PK)?,
            sk: Self::string_attr(map, ATTR_SK)?,
            data: Self::string_attr(map, ATTR_DATA)?,
        })
    }

    fn is_conditional_check_failed(err: &SdkError<PutItemError>) -> bool {
        match err {
            SdkError::ServiceError(service_err) => {
                matches!(
                    service_err.err(),
                    PutItemError::ConditionalCheckFailedException(_)
                )
            }
            _ => false,
        }
    }

    /// Run a paginated query. Each `(name, attribute, value)` binds
    /// `#name` to the attribute and `:name` to the value.
    async fn query_all(
        &self,
        index: Option<&str>,
        condition: &str,
        bindings: &[(&str, &str, &str)],
    ) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .set_index_name(index.map(str::to_string))
                .key_condition_expression(condition);

            for (name, attribute, value) in bindings {
                request = request
                    .expression_attribute_names(format!("#{}", name), *attribute)
                    .expression_attribute_values(
                        format!(":{}", name),
                        AttributeValue::S(value.to_string()),
                    );
            }

            if let Some(key) = last_evaluated_key.take() {
                request = request.set_exclusive_start_key(Some(key));
            }

            let response = request.send().await.map_err(|e| {
                StorageError::Dynamo(format!("DynamoDB query failed: {}", e))
            })?;

            for map in response.items() {
                items.push(Self::to_item(map)?);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => last_evaluated_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get(&self, keys: &Keys) -> Result<Item> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_map(keys)))
            .send()
            .await
            .map_err(|e| StorageError::Dynamo(format!("DynamoDB get_item failed: {}", e)))?;

        match result.item {
            Some(map) => Self::to_item(&map),
            None => Err(StorageError::not_found(keys)),
        }
    }

    async fn create(&self, item: Item) -> Result<()> {
        let keys = item.keys();

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::item_map(item)))
            .condition_expression("attribute_not_exists(PK) AND attribute_not_exists(SK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if Self::is_conditional_check_failed(&e) => {
                debug!(pk = %keys.pk, sk = %keys.sk, "create rejected, item exists");
                Err(StorageError::AlreadyExists {
                    pk: keys.pk,
                    sk: keys.sk,
                })
            }
            Err(e) => Err(StorageError::Dynamo(format!(
                "DynamoDB put_item failed: {}",
                e
            ))),
        }
    }

    async fn put(&self, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::item_map(item)))
            .send()
            .await
            .map_err(|e| StorageError::Dynamo(format!("DynamoDB put_item failed: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, keys: &Keys) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_map(keys)))
            .send()
            .await
            .map_err(|e| StorageError::Dynamo(format!("DynamoDB delete_item failed: {}", e)))?;

        Ok(())
    }

    async fn get_one_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Item> {
        let items = self.get_all_by_partial_sk(pk, sk_prefix).await?;
        single_match(pk, sk_prefix, items)
    }

    async fn get_all_by_partial_sk(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.query_all(
            None,
            "#PK = :PK and begins_with(#SK, :SK)",
            &[("PK", ATTR_PK, pk), ("SK", ATTR_SK, sk_prefix)],
        )
        .await
    }

    async fn get_all_by_gsi(&self, index: &str, sk: &str) -> Result<Vec<Item>> {
        check_index(index)?;
        self.query_all(Some(ACTOR_INDEX), "#SK = :SK", &[("SK", ATTR_SK, sk)])
            .await
    }

    async fn get_all_by_keys(&self, keys: &[Keys]) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(BATCH_GET_LIMIT) {
            let mut pending = Some(
                KeysAndAttributes::builder()
                    .set_keys(Some(chunk.iter().map(Self::key_map).collect()))
                    .build()
                    .map_err(|e| StorageError::Dynamo(format!("invalid batch request: {}", e)))?,
            );

            while let Some(request) = pending.take() {
                let output = self
                    .client
                    .batch_get_item()
                    .request_items(&self.table_name, request)
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::Dynamo(format!("DynamoDB batch_get_item failed: {}", e))
                    })?;

                if let Some(maps) = output
                    .responses
                    .as_ref()
                    .and_then(|responses| responses.get(&self.table_name))
                {
                    for map in maps {
                        items.push(Self::to_item(map)?);
                    }
                }

                pending = output
                    .unprocessed_keys
                    .and_then(|mut unprocessed| unprocessed.remove(&self.table_name))
                    .filter(|request| !request.keys().is_empty());
            }
        }

        Ok(items)
    }
}
