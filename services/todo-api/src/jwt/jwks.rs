//! JSON Web Key Set types and retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// JSON Web Key structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jwk {
    /// Key ID
    pub kid: String,
    /// Key type (RSA)
    pub kty: String,
    /// Algorithm
    pub alg: String,
    /// Key use (sig)
    #[serde(rename = "use")]
    pub key_use: String,
    /// RSA modulus, base64url
    pub n: String,
    /// RSA exponent, base64url
    pub e: String,
}

#[derive(Deserialize)]
struct JwksDocument {
    #[serde(default)]
    keys: Vec<Jwk>,
}

/// Parsed key set, indexed by key id.
///
/// The published order is kept; when two entries share a key id the first
/// one wins.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<Jwk>,
    by_kid: HashMap<String, usize>,
}

impl KeySet {
    /// Builds a key set from records in published order.
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        let mut by_kid = HashMap::with_capacity(keys.len());
        for (idx, key) in keys.iter().enumerate() {
            by_kid.entry(key.kid.clone()).or_insert(idx);
        }
        Self { keys, by_kid }
    }

    /// Parses a JWKS JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, KeySetFetchError> {
        let document: JwksDocument =
            serde_json::from_slice(bytes).map_err(|e| KeySetFetchError::Decode {
                reason: e.to_string(),
            })?;
        Ok(Self::new(document.keys))
    }

    /// Exact-match lookup by key id.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.by_kid.get(kid).map(|idx| &self.keys[*idx])
    }

    /// Number of published keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the identity provider published no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Key set retrieval failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeySetFetchError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("failed to fetch JWKS: {reason}")]
    Network {
        /// Client message
        reason: String,
    },

    /// The endpoint answered with a non-success status
    #[error("failed to fetch JWKS: status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The body is not a JWKS document
    #[error("failed to decode JWKS: {reason}")]
    Decode {
        /// Parser message
        reason: String,
    },
}

impl From<reqwest::Error> for KeySetFetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode {
                reason: err.to_string(),
            }
        } else {
            Self::Network {
                reason: err.to_string(),
            }
        }
    }
}

/// Source of the identity provider's current signing keys.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Returns the current key set, possibly from a cache.
    async fn fetch(&self) -> Result<Arc<KeySet>, KeySetFetchError>;

    /// Returns a key set newer than the last `fetch`, or `None` when this
    /// source has nothing fresher to offer.
    async fn refresh(&self) -> Result<Option<Arc<KeySet>>, KeySetFetchError> {
        Ok(None)
    }
}

/// Fetches the JWKS document over HTTP on every call.
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Creates a fetcher with its own client bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, KeySetFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetFetchError::Network {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self::with_client(url, client))
    }

    /// Creates a fetcher sharing an existing client.
    #[must_use]
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Arc<KeySet>, KeySetFetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(KeySetFetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let key_set = KeySet::from_json(&body)?;
        debug!(keys = key_set.len(), "Fetched JWKS");
        Ok(Arc::new(key_set))
    }
}
