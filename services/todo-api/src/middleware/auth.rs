//! Bearer token authentication.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::jwt::{AuthError, TokenValidator};

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// The value must split on single spaces into exactly two parts, the first
/// being `Bearer`. An empty header counts as missing.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        None => return Err(AuthError::MissingAuth),
        Some(value) if value.is_empty() => return Err(AuthError::MissingAuth),
        Some(value) => value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?,
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}

/// Rejects the request with 401 unless it carries a valid bearer token.
///
/// Verified claims are stored in the request extensions.
pub async fn require_bearer(
    State(validator): State<Arc<TokenValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = validator.validate(token).await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
