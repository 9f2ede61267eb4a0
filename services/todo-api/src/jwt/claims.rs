//! Typed claims extracted from a verified token payload.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::jwt::validator::AuthError;

/// Typed view over a verified token payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claims {
    /// Audience, the client id the token was issued to
    pub aud: String,
    /// Subject, the user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issuer URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Expiry, seconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Cognito token kind, `id` or `access`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    /// User email, on id tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Every other claim, untouched
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Claims {
    /// Splits a decoded payload into typed claims.
    ///
    /// `aud` must be a single string. Optional claims with an unexpected
    /// JSON type stay in `custom` instead of failing the token.
    pub fn from_payload(mut payload: Map<String, Value>) -> Result<Self, AuthError> {
        let aud = match payload.remove("aud") {
            Some(Value::String(aud)) => aud,
            _ => return Err(AuthError::ClaimMissing { claim: "aud" }),
        };

        Ok(Self {
            aud,
            sub: take_string(&mut payload, "sub"),
            iss: take_string(&mut payload, "iss"),
            exp: take_i64(&mut payload, "exp"),
            iat: take_i64(&mut payload, "iat"),
            token_use: take_string(&mut payload, "token_use"),
            email: take_string(&mut payload, "email"),
            custom: payload,
        })
    }
}

fn take_string(payload: &mut Map<String, Value>, name: &str) -> Option<String> {
    match payload.remove(name) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            payload.insert(name.to_string(), other);
            None
        }
        None => None,
    }
}

fn take_i64(payload: &mut Map<String, Value>, name: &str) -> Option<i64> {
    match payload.remove(name) {
        Some(Value::Number(n)) if n.is_i64() => n.as_i64(),
        Some(other) => {
            payload.insert(name.to_string(), other);
            None
        }
        None => None,
    }
}
