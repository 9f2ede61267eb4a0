//! Todo API - Multi-tenant todo service behind bearer token authentication.
//!
//! This crate provides the JWKS-backed token validation pipeline, the
//! authentication and CORS middleware, and the tenant-scoped todo handler
//! that translates requests into key-value store operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod observability;
pub mod shutdown;
pub mod store;
pub mod todo;

pub use app::{build_router, AppState};
pub use config::Config;
pub use error::{ApiError, ErrorCode};
