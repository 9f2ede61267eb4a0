//! Bearer token verification against the identity provider's JWKS.

pub mod claims;
pub mod jwk_cache;
pub mod jwks;
pub mod rsa_key;
pub mod validator;

pub use claims::Claims;
pub use jwk_cache::CachedKeySetFetcher;
pub use jwks::{HttpKeySetFetcher, Jwk, KeySet, KeySetFetchError, KeySetFetcher};
pub use rsa_key::{KeyDecodeError, RsaPublicKey};
pub use validator::{validate, AuthError, TokenValidator};
