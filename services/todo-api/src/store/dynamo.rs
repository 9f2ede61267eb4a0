//! DynamoDB table backend.
//!
//! Items carry `PK`, `SK`, `ID`, `Title` and `Completed` attributes. Only the
//! key attributes are required when reading back; a missing `ID` is recovered
//! from the sort key.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, instrument};

use super::{ItemKey, ItemUpdate, StoreError, TodoRecord, TodoStore, TODO_PREFIX};

const PK: &str = "PK";
const SK: &str = "SK";
const ID: &str = "ID";
const TITLE: &str = "Title";
const COMPLETED: &str = "Completed";

/// Table accessed through the AWS SDK.
#[derive(Debug, Clone)]
pub struct DynamoTodoStore {
    client: Client,
    table_name: String,
}

impl DynamoTodoStore {
    /// Wraps an existing SDK client.
    #[must_use]
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Builds a client from the default credential chain for `region`.
    ///
    /// `endpoint_url` points the client at a local table emulator.
    pub async fn from_env(
        region: impl Into<String>,
        table_name: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.into()));
        if let Some(url) = endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), table_name)
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<TodoRecord>, StoreError> {
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk)")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":sk", AttributeValue::S(sk_prefix.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| backend("query", &e))?;

            for item in output.items() {
                records.push(record_from_item(item)?);
            }

            start_key = output.last_evaluated_key().cloned();
            if start_key.is_none() {
                break;
            }
            debug!(fetched = records.len(), "Query page truncated, continuing");
        }

        Ok(records)
    }

    #[instrument(skip(self, record), fields(table = %self.table_name, sk = %record.key.sk))]
    async fn put_item(&self, record: TodoRecord) -> Result<(), StoreError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_from_record(&record)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::Conflict { key: record.key })
            }
            Err(e) => Err(backend("put_item", &e)),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn update_item(&self, key: &ItemKey, update: ItemUpdate) -> Result<(), StoreError> {
        let ItemUpdate::SetCompleted(completed) = update;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .update_expression("SET #c = :c")
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_names("#c", COMPLETED)
            .expression_attribute_values(":c", AttributeValue::Bool(completed))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::NotFound { key: key.clone() })
            }
            Err(e) => Err(backend("update_item", &e)),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(|e| backend("delete_item", &e))?;
        Ok(())
    }
}

fn backend<E: std::error::Error>(operation: &str, err: &E) -> StoreError {
    StoreError::Backend(format!("{operation}: {}", DisplayErrorContext(err)))
}

fn key_attributes(key: &ItemKey) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (PK.to_string(), AttributeValue::S(key.pk.clone())),
        (SK.to_string(), AttributeValue::S(key.sk.clone())),
    ])
}

fn item_from_record(record: &TodoRecord) -> HashMap<String, AttributeValue> {
    let mut item = key_attributes(&record.key);
    item.insert(ID.to_string(), AttributeValue::S(record.id.clone()));
    item.insert(TITLE.to_string(), AttributeValue::S(record.title.clone()));
    item.insert(COMPLETED.to_string(), AttributeValue::Bool(record.completed));
    item
}

fn record_from_item(item: &HashMap<String, AttributeValue>) -> Result<TodoRecord, StoreError> {
    let key = ItemKey {
        pk: string_attr(item, PK)?.ok_or_else(|| missing(PK))?,
        sk: string_attr(item, SK)?.ok_or_else(|| missing(SK))?,
    };
    let id = match string_attr(item, ID)? {
        Some(id) => id,
        None => key
            .sk
            .strip_prefix(TODO_PREFIX)
            .unwrap_or(&key.sk)
            .to_string(),
    };
    let completed = match item.get(COMPLETED) {
        Some(value) => *value.as_bool().map_err(|_| mistyped(COMPLETED, "BOOL"))?,
        None => false,
    };

    Ok(TodoRecord {
        title: string_attr(item, TITLE)?.unwrap_or_default(),
        key,
        id,
        completed,
    })
}

fn string_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<Option<String>, StoreError> {
    item.get(name)
        .map(|value| value.as_s().cloned().map_err(|_| mistyped(name, "S")))
        .transpose()
}

fn missing(name: &str) -> StoreError {
    StoreError::Backend(format!("item has no {name} attribute"))
}

fn mistyped(name: &str, expected: &str) -> StoreError {
    StoreError::Backend(format!("attribute {name} is not of type {expected}"))
}
