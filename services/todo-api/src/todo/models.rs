//! Wire types for the todo endpoint.
//!
//! Field names follow the capitalised spelling clients were built against
//! (`Title`, `ID`, `Completed`) and also accept the lowercase forms.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::TodoRecord;

/// `POST /` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTodoRequest {
    /// Title of the new todo
    #[serde(rename = "Title", alias = "title")]
    pub title: String,
}

/// `PUT /` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTodoRequest {
    /// Todo to update
    #[serde(rename = "ID", alias = "id", alias = "Id")]
    pub id: String,
    /// New completed flag
    #[serde(rename = "Completed", alias = "completed")]
    pub completed: bool,
}

/// `DELETE /` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteTodoRequest {
    /// Todo to delete
    #[serde(rename = "ID", alias = "id", alias = "Id")]
    pub id: String,
}

/// One element of the `GET /` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Todo id
    #[serde(rename = "ID")]
    pub id: String,
    /// Title
    #[serde(rename = "Title")]
    pub title: String,
    /// Done flag
    #[serde(rename = "Completed")]
    pub completed: bool,
}

impl From<TodoRecord> for TodoItem {
    fn from(record: TodoRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            completed: record.completed,
        }
    }
}

/// Decodes a JSON body, mapping failures to a 400.
pub(crate) fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::RequestDecode(e.to_string()))
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(())
}
