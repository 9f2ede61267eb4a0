//! Bearer token validation against a JWKS key set.
//!
//! The pipeline is strictly ordered: header, key lookup, key decoding,
//! signature, then claims. Nothing in the payload is inspected before the
//! signature has been verified.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::jwt::claims::Claims;
use crate::jwt::jwks::{KeySet, KeySetFetchError, KeySetFetcher};
use crate::jwt::rsa_key::{KeyDecodeError, RsaPublicKey};

/// Authentication failures. Every variant maps to 401.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing Authorization header")]
    MissingAuth,

    /// Header present but not `Bearer <token>`
    #[error("Invalid Authorization header format")]
    MalformedAuthHeader,

    /// The key set could not be retrieved
    #[error(transparent)]
    KeySetFetch(#[from] KeySetFetchError),

    /// Header segment unreadable or without `kid`
    #[error("invalid token header: {reason}")]
    MalformedToken {
        /// What was wrong with the header
        reason: String,
    },

    /// `kid` not present in the key set
    #[error("unable to find matching key: {kid}")]
    UnknownKey {
        /// Key id from the token header
        kid: String,
    },

    /// The matching JWK is not a usable RSA key
    #[error(transparent)]
    KeyDecode(#[from] KeyDecodeError),

    /// Signature, expiry or structure check failed
    #[error("failed to parse token: {reason}")]
    SignatureInvalid {
        /// Verification failure
        reason: String,
    },

    /// Required claim absent or of the wrong type
    #[error("{claim} claim missing")]
    ClaimMissing {
        /// Claim name
        claim: &'static str,
    },

    /// Token issued for another client
    #[error("invalid audience: expected {expected}, got {actual}")]
    AudienceMismatch {
        /// Configured client id
        expected: String,
        /// `aud` from the token
        actual: String,
    },
}

impl AuthError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingAuth => "AUTH_MISSING",
            Self::MalformedAuthHeader => "AUTH_HEADER_MALFORMED",
            Self::KeySetFetch(_) => "AUTH_KEYSET_UNAVAILABLE",
            Self::MalformedToken { .. } => "AUTH_TOKEN_MALFORMED",
            Self::UnknownKey { .. } => "AUTH_UNKNOWN_KEY",
            Self::KeyDecode(_) => "AUTH_KEY_INVALID",
            Self::SignatureInvalid { .. } => "AUTH_SIGNATURE_INVALID",
            Self::ClaimMissing { .. } => "AUTH_CLAIM_MISSING",
            Self::AudienceMismatch { .. } => "AUTH_AUDIENCE_MISMATCH",
        }
    }

    /// True for failures of the `Authorization` header itself.
    #[must_use]
    pub const fn is_header_error(&self) -> bool {
        matches!(self, Self::MissingAuth | Self::MalformedAuthHeader)
    }
}

/// Algorithms an RSA JWK can verify.
const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Validates `token` against `key_set` and the expected audience.
pub fn validate(token: &str, key_set: &KeySet, expected_audience: &str) -> Result<Claims, AuthError> {
    let header = decode_header(token).map_err(|e| AuthError::MalformedToken {
        reason: e.to_string(),
    })?;
    let kid = header.kid.ok_or_else(|| AuthError::MalformedToken {
        reason: "missing kid".to_string(),
    })?;

    let jwk = key_set
        .find(&kid)
        .ok_or_else(|| AuthError::UnknownKey { kid: kid.clone() })?;
    let public_key = RsaPublicKey::from_components(&jwk.n, &jwk.e)?;

    if !RSA_ALGORITHMS.contains(&header.alg) {
        return Err(AuthError::SignatureInvalid {
            reason: format!("unexpected signing method {:?}", header.alg),
        });
    }

    let mut validation = Validation::new(header.alg);
    validation.validate_aud = false;
    validation.validate_nbf = true;
    validation.leeway = 0;
    validation.required_spec_claims.clear();

    let token_data = decode::<Map<String, Value>>(token, &public_key.decoding_key(), &validation)
        .map_err(|e| AuthError::SignatureInvalid {
            reason: describe_decode_error(&e),
        })?;

    let claims = Claims::from_payload(token_data.claims)?;
    if claims.aud != expected_audience {
        return Err(AuthError::AudienceMismatch {
            expected: expected_audience.to_string(),
            actual: claims.aud,
        });
    }

    Ok(claims)
}

fn describe_decode_error(error: &jsonwebtoken::errors::Error) -> String {
    match error.kind() {
        ErrorKind::InvalidSignature => "signature is invalid".to_string(),
        ErrorKind::ExpiredSignature => "token is expired".to_string(),
        ErrorKind::ImmatureSignature => "token is not valid yet".to_string(),
        _ => error.to_string(),
    }
}

/// Couples a key set source with the audience this service accepts.
pub struct TokenValidator {
    fetcher: Arc<dyn KeySetFetcher>,
    audience: String,
}

impl TokenValidator {
    /// Creates a validator for tokens issued to `audience`.
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, audience: impl Into<String>) -> Self {
        Self {
            fetcher,
            audience: audience.into(),
        }
    }

    /// Fetches keys and validates `token`.
    ///
    /// An unknown `kid` triggers one refresh of the key set, which covers
    /// signing keys rotated since the set was cached.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let key_set = self.fetcher.fetch().await?;

        match validate(token, &key_set, &self.audience) {
            Err(AuthError::UnknownKey { kid }) => {
                debug!(kid = %kid, "Unknown key id, refreshing key set");
                match self.fetcher.refresh().await? {
                    Some(fresh) => validate(token, &fresh, &self.audience),
                    None => Err(AuthError::UnknownKey { kid }),
                }
            }
            result => result,
        }
    }
}
