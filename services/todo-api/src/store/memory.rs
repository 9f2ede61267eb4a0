//! In-memory table backend.
//!
//! Keeps records in a `BTreeMap` ordered by `(pk, sk)`, so a partition query
//! is a range scan that yields items in sort-key order, like a real table.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{ItemKey, ItemUpdate, StoreError, TodoRecord, TodoStore};

/// Single table held in process memory.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    table_name: String,
    items: RwLock<BTreeMap<ItemKey, TodoRecord>>,
}

impl MemoryTodoStore {
    /// Creates an empty table.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total record count across all partitions.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// True when the table holds no records.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<TodoRecord>, StoreError> {
        let start = ItemKey {
            pk: pk.to_string(),
            sk: sk_prefix.to_string(),
        };
        let items = self.items.read().await;

        Ok(items
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|(key, _)| key.pk == pk && key.sk.starts_with(sk_prefix))
            .map(|(_, record)| record.clone())
            .collect())
    }

    #[instrument(skip(self, record), fields(table = %self.table_name, sk = %record.key.sk))]
    async fn put_item(&self, record: TodoRecord) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        if items.contains_key(&record.key) {
            return Err(StoreError::Conflict { key: record.key });
        }
        items.insert(record.key.clone(), record);
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn update_item(&self, key: &ItemKey, update: ItemUpdate) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        let record = items
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })?;

        match update {
            ItemUpdate::SetCompleted(completed) => record.completed = completed,
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{tenant_partition, TODO_PREFIX};
    use tokio_test::{assert_err, assert_ok};

    async fn seeded() -> MemoryTodoStore {
        let store = MemoryTodoStore::new("todos");
        for (tenant, id, title) in [
            ("t1", "b", "second"),
            ("t1", "a", "first"),
            ("t2", "a", "other tenant"),
            ("t1x", "a", "prefix neighbour"),
        ] {
            store
                .put_item(TodoRecord::new_todo(tenant, id, title))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_query_scoped_to_partition_and_sorted() {
        let store = seeded().await;

        let items = store.query(&tenant_partition("t1"), TODO_PREFIX).await.unwrap();
        let titles: Vec<_> = items.iter().map(|r| r.title.as_str()).collect();

        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_query_unknown_partition_is_empty() {
        let store = seeded().await;
        let items = store.query(&tenant_partition("nobody"), TODO_PREFIX).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_query_respects_sort_prefix() {
        let store = seeded().await;
        let items = store.query(&tenant_partition("t1"), "NOTE#").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_put_conflict() {
        let store = seeded().await;
        let err = assert_err!(store.put_item(TodoRecord::new_todo("t1", "a", "dup")).await);

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_update_sets_completed() {
        let store = seeded().await;
        let key = ItemKey::todo("t1", "a");

        store.update_item(&key, ItemUpdate::SetCompleted(true)).await.unwrap();

        let items = store.query(&key.pk, TODO_PREFIX).await.unwrap();
        assert!(items.iter().find(|r| r.id == "a").unwrap().completed);
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let store = seeded().await;
        let result = store
            .update_item(&ItemKey::todo("t2", "b"), ItemUpdate::SetCompleted(true))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded().await;
        let key = ItemKey::todo("t1", "a");

        assert_ok!(store.delete_item(&key).await);
        assert_ok!(store.delete_item(&key).await);

        assert_eq!(store.len().await, 3);
    }
}
