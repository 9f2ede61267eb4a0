//! Cross-origin headers.
//!
//! `CorsLayer` answers every `OPTIONS` request itself with an empty 200, so
//! pre-flight never reaches authentication. The allow-methods and
//! allow-headers values are also stamped on every other response.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower::layer::util::Stack;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::todo::TENANT_HEADER;

/// Value of `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
/// Value of `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Tenant-ID";

/// CORS stack: pre-flight handling plus headers on all responses.
pub fn cors_layer() -> Stack<
    SetResponseHeaderLayer<HeaderValue>,
    Stack<SetResponseHeaderLayer<HeaderValue>, CorsLayer>,
> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(TENANT_HEADER),
        ]);

    let methods = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    let headers = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );

    Stack::new(headers, Stack::new(methods, cors))
}
