//! Observability module
//!
//! Structured logging through `tracing`; request spans come from
//! [`crate::middleware::trace_layer`].

pub mod logging;

pub use logging::{init_tracing, LogFormat};
