//! Per-call deadline for store operations.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use super::{ItemKey, ItemUpdate, StoreError, TodoRecord, TodoStore};

/// Wraps a store so no call waits longer than `duration`.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    duration: Duration,
}

impl<S> TimeoutStore<S> {
    /// Creates a new timeout wrapper with the given duration
    pub const fn new(inner: S, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// Creates a new timeout wrapper from seconds
    pub const fn from_secs(inner: S, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match timeout(self.duration, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                duration: self.duration,
            }),
        }
    }
}

#[async_trait]
impl<S: TodoStore> TodoStore for TimeoutStore<S> {
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<TodoRecord>, StoreError> {
        self.bounded("query", self.inner.query(pk, sk_prefix)).await
    }

    async fn put_item(&self, record: TodoRecord) -> Result<(), StoreError> {
        self.bounded("put_item", self.inner.put_item(record)).await
    }

    async fn update_item(&self, key: &ItemKey, update: ItemUpdate) -> Result<(), StoreError> {
        self.bounded("update_item", self.inner.update_item(key, update))
            .await
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.bounded("delete_item", self.inner.delete_item(key)).await
    }
}
