//! Method dispatch for `/`.
//!
//! Each request performs exactly one store call. The tenant header selects
//! the partition; nothing else about the caller reaches the store.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::store::{tenant_partition, ItemKey, ItemUpdate, TodoRecord, TODO_PREFIX};
use crate::todo::models::{
    decode, require_non_blank, CreateTodoRequest, DeleteTodoRequest, TodoItem, UpdateTodoRequest,
};

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Handles every method on `/`.
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if !matches!(
        method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE
    ) {
        return Err(ApiError::MethodNotSupported);
    }

    let tenant = tenant_from(&headers)?;

    match method {
        Method::GET => list_todos(&state, tenant).await,
        Method::POST => create_todo(&state, tenant, &body).await,
        Method::PUT => update_todo(&state, tenant, &body).await,
        _ => delete_todo(&state, tenant, &body).await,
    }
}

fn tenant_from(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|tenant| !tenant.is_empty())
        .ok_or(ApiError::MissingTenant)
}

async fn list_todos(state: &AppState, tenant: &str) -> Result<Response, ApiError> {
    let records = state
        .store
        .query(&tenant_partition(tenant), TODO_PREFIX)
        .await?;
    debug!(tenant = %tenant, count = records.len(), "Listed todos");

    let items: Vec<TodoItem> = records.into_iter().map(TodoItem::from).collect();
    Ok((StatusCode::OK, Json(items)).into_response())
}

async fn create_todo(state: &AppState, tenant: &str, body: &[u8]) -> Result<Response, ApiError> {
    let request: CreateTodoRequest = decode(body)?;
    require_non_blank("Title", &request.title)?;

    let id = Uuid::new_v4().simple().to_string();
    state
        .store
        .put_item(TodoRecord::new_todo(tenant, id.as_str(), request.title))
        .await?;
    info!(tenant = %tenant, id = %id, "Created todo");

    Ok(StatusCode::CREATED.into_response())
}

async fn update_todo(state: &AppState, tenant: &str, body: &[u8]) -> Result<Response, ApiError> {
    let request: UpdateTodoRequest = decode(body)?;
    require_non_blank("ID", &request.id)?;

    state
        .store
        .update_item(
            &ItemKey::todo(tenant, &request.id),
            ItemUpdate::SetCompleted(request.completed),
        )
        .await?;
    info!(tenant = %tenant, id = %request.id, completed = request.completed, "Updated todo");

    Ok(StatusCode::OK.into_response())
}

async fn delete_todo(state: &AppState, tenant: &str, body: &[u8]) -> Result<Response, ApiError> {
    let request: DeleteTodoRequest = decode(body)?;
    require_non_blank("ID", &request.id)?;

    state
        .store
        .delete_item(&ItemKey::todo(tenant, &request.id))
        .await?;
    info!(tenant = %tenant, id = %request.id, "Deleted todo");

    Ok(StatusCode::OK.into_response())
}
