//! Tower/axum layers wrapped around the todo route.

pub mod auth;
pub mod cors;
pub mod tracing;

pub use auth::{bearer_token, require_bearer};
pub use cors::{cors_layer, ALLOWED_HEADERS, ALLOWED_METHODS};
pub use self::tracing::{trace_layer, RequestSpan};
