//! Key-value table abstraction for todo records.
//!
//! Records live under a composite key: the partition key scopes a tenant and
//! the sort key identifies one todo inside it. Tenant isolation rests entirely
//! on the partition key; there is no operation that spans partitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod dynamo;
pub mod memory;
pub mod timeout;

pub use dynamo::DynamoTodoStore;
pub use memory::MemoryTodoStore;
pub use timeout::TimeoutStore;

/// Partition key prefix for tenants.
pub const TENANT_PREFIX: &str = "TENANT#";
/// Sort key prefix for todo items.
pub const TODO_PREFIX: &str = "TODO#";

/// Composite primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Partition key
    pub pk: String,
    /// Sort key
    pub sk: String,
}

impl ItemKey {
    /// Key of todo `id` owned by `tenant`.
    #[must_use]
    pub fn todo(tenant: &str, id: &str) -> Self {
        Self {
            pk: tenant_partition(tenant),
            sk: format!("{TODO_PREFIX}{id}"),
        }
    }
}

/// Partition key of `tenant`.
#[must_use]
pub fn tenant_partition(tenant: &str) -> String {
    format!("{TENANT_PREFIX}{tenant}")
}

/// A persisted todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    /// Composite key
    pub key: ItemKey,
    /// Todo id, unique within the tenant
    pub id: String,
    /// Title
    pub title: String,
    /// Done flag
    pub completed: bool,
}

impl TodoRecord {
    /// A fresh, not yet completed todo.
    #[must_use]
    pub fn new_todo(tenant: &str, id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            key: ItemKey::todo(tenant, &id),
            id,
            title: title.into(),
            completed: false,
        }
    }
}

/// In-place attribute update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUpdate {
    /// `SET Completed = :c`
    SetCompleted(bool),
}

/// Store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Conditional update found no item
    #[error("item not found: {}/{}", .key.pk, .key.sk)]
    NotFound {
        /// Key that was addressed
        key: ItemKey,
    },

    /// Conditional put found an existing item
    #[error("item already exists: {}/{}", .key.pk, .key.sk)]
    Conflict {
        /// Key that was addressed
        key: ItemKey,
    },

    /// The call did not finish in time
    #[error("store operation {operation} timed out after {duration:?}")]
    Timeout {
        /// Operation name
        operation: &'static str,
        /// Deadline that elapsed
        duration: Duration,
    },

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Single-table key-value operations used by the todo handler.
///
/// Each call is one atomic store operation; there are no multi-item writes.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All records in partition `pk` whose sort key starts with `sk_prefix`,
    /// ordered by sort key.
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<TodoRecord>, StoreError>;

    /// Inserts `record`; fails with [`StoreError::Conflict`] if its key is taken.
    async fn put_item(&self, record: TodoRecord) -> Result<(), StoreError>;

    /// Applies `update` to an existing record; fails with
    /// [`StoreError::NotFound`] if there is none.
    async fn update_item(&self, key: &ItemKey, update: ItemUpdate) -> Result<(), StoreError>;

    /// Removes the record at `key`. Deleting a missing key succeeds.
    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError>;
}
