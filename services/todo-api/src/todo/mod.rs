//! Tenant-scoped todo CRUD over a single method-dispatched route.

pub mod handler;
pub mod models;

pub use handler::{handle, TENANT_HEADER};
pub use models::{CreateTodoRequest, DeleteTodoRequest, TodoItem, UpdateTodoRequest};
