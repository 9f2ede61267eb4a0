//! Request-level error handling
//!
//! Every failure in the request path ends up as an [`ApiError`], which knows
//! its status code, a stable [`ErrorCode`], and how to render itself as a
//! plain-text response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::jwt::AuthError;
use crate::store::StoreError;

/// Errors surfaced to API clients
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bearer token missing or rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Body is not the expected JSON shape
    #[error("{0}")]
    RequestDecode(String),

    /// Body decoded but a field is unusable
    #[error("{0}")]
    InvalidRequest(String),

    /// `X-Tenant-ID` absent or empty
    #[error("Missing X-Tenant-ID header")]
    MissingTenant,

    /// Key-value store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// HTTP method outside GET/POST/PUT/DELETE
    #[error("Method not allowed")]
    MethodNotSupported,
}

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Any authentication failure
    Unauthorized,
    /// Malformed body
    BadRequest,
    /// Invalid field value
    InvalidRequest,
    /// No tenant header
    MissingTenant,
    /// Item does not exist
    NotFound,
    /// Item already exists
    Conflict,
    /// Store call exceeded its deadline
    Timeout,
    /// Unsupported method
    MethodNotAllowed,
    /// Any other failure
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::MissingTenant => "MISSING_TENANT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Timeout => "STORE_TIMEOUT",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest | Self::InvalidRequest | Self::MissingTenant => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Auth(_) => ErrorCode::Unauthorized,
            Self::RequestDecode(_) => ErrorCode::BadRequest,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MissingTenant => ErrorCode::MissingTenant,
            Self::Store(StoreError::NotFound { .. }) => ErrorCode::NotFound,
            Self::Store(StoreError::Conflict { .. }) => ErrorCode::Conflict,
            Self::Store(StoreError::Timeout { .. }) => ErrorCode::Timeout,
            Self::Store(StoreError::Backend(_)) => ErrorCode::Internal,
            Self::MethodNotSupported => ErrorCode::MethodNotAllowed,
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code().status()
    }

    /// Text written to the response body.
    ///
    /// Token failures are prefixed with `Invalid token: `; failures of the
    /// header itself are reported as-is.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::Auth(err) if err.is_header_error() => err.to_string(),
            Self::Auth(err) => format!("Invalid token: {err}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Auth(err) => {
                warn!(error_code = err.code(), error = %err, "Authentication failed");
            }
            Self::Store(err) => {
                error!(error_code = self.code().as_str(), error = %err, "Store operation failed");
            }
            _ => {
                warn!(error_code = self.code().as_str(), status = status.as_u16(), error = %self, "Request rejected");
            }
        }

        (status, self.body()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ItemKey;
    use std::time::Duration;

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [
            AuthError::MissingAuth,
            AuthError::MalformedAuthHeader,
            AuthError::UnknownKey { kid: "k".into() },
            AuthError::ClaimMissing { claim: "aud" },
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_header_errors_render_verbatim() {
        assert_eq!(
            ApiError::from(AuthError::MissingAuth).body(),
            "Missing Authorization header"
        );
        assert_eq!(
            ApiError::from(AuthError::MalformedAuthHeader).body(),
            "Invalid Authorization header format"
        );
    }

    #[test]
    fn test_token_errors_are_prefixed() {
        let err = ApiError::from(AuthError::AudienceMismatch {
            expected: "web".into(),
            actual: "mobile".into(),
        });
        assert_eq!(
            err.body(),
            "Invalid token: invalid audience: expected web, got mobile"
        );
    }

    #[test]
    fn test_store_error_statuses() {
        let key = ItemKey::todo("t1", "a");
        let cases = [
            (StoreError::NotFound { key: key.clone() }, StatusCode::NOT_FOUND),
            (StoreError::Conflict { key }, StatusCode::CONFLICT),
            (
                StoreError::Timeout {
                    operation: "query",
                    duration: Duration::from_secs(1),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StoreError::Backend("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_request_errors() {
        assert_eq!(ApiError::MissingTenant.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::RequestDecode("bad".into()).code().as_str(),
            "BAD_REQUEST"
        );
        assert_eq!(
            ApiError::MethodNotSupported.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiError::MethodNotSupported.body(), "Method not allowed");
    }
}
