//! Router assembly and shared request context.

use std::sync::Arc;

use axum::routing::any;
use axum::{middleware, Router};

use crate::jwt::TokenValidator;
use crate::middleware::{cors_layer, require_bearer, trace_layer};
use crate::store::TodoStore;
use crate::todo;

/// Context built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Bearer token validator bound to the expected audience
    pub validator: Arc<TokenValidator>,
    /// Todo table
    pub store: Arc<dyn TodoStore>,
}

impl AppState {
    /// Creates the shared context.
    pub fn new(validator: Arc<TokenValidator>, store: Arc<dyn TodoStore>) -> Self {
        Self { validator, store }
    }
}

/// Builds the service router.
///
/// Layering, outermost first: request tracing, CORS (answers pre-flight),
/// bearer authentication, then the todo handler on `/`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(todo::handle))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.validator),
            require_bearer,
        ))
        .with_state(state)
        .layer(cors_layer())
        .layer(trace_layer())
}
