//! Shared fixtures for integration tests: RSA keys, token minting, static key
//! sources and an in-memory app.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use todo_api::jwt::{KeySet, KeySetFetchError, KeySetFetcher, TokenValidator};
use todo_api::store::{MemoryTodoStore, TodoStore};
use todo_api::{build_router, AppState};

pub const PRIMARY_KEY: &str = include_str!("../fixtures/primary_key.pem");
pub const SECONDARY_KEY: &str = include_str!("../fixtures/secondary_key.pem");
pub const ROGUE_KEY: &str = include_str!("../fixtures/rogue_key.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");
pub const ROGUE_JWKS: &str = include_str!("../fixtures/rogue_jwks.json");

pub const PRIMARY_KID: &str = "primary-key-1";
pub const SECONDARY_KID: &str = "secondary-key-1";
pub const ROGUE_KID: &str = "rogue-key-1";

pub const CLIENT_ID: &str = "web-client";

pub fn key_set() -> KeySet {
    KeySet::from_json(JWKS.as_bytes()).unwrap()
}

pub fn rogue_key_set() -> KeySet {
    KeySet::from_json(ROGUE_JWKS.as_bytes()).unwrap()
}

/// Claims of a token valid for the next hour.
pub fn claims_for(audience: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": "user-1",
        "aud": audience,
        "iss": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_test",
        "token_use": "id",
        "iat": now,
        "exp": now + 3600,
    })
}

/// Signs `claims` with an RS256 PEM key, putting `kid` in the header.
pub fn mint(key_pem: &str, kid: Option<&str>, claims: &Value) -> String {
    mint_with(Algorithm::RS256, key_pem, kid, claims)
}

pub fn mint_with(alg: Algorithm, key_pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(key_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// A valid primary-key token for [`CLIENT_ID`].
pub fn valid_token() -> String {
    mint(PRIMARY_KEY, Some(PRIMARY_KID), &claims_for(CLIENT_ID))
}

/// Serves a fixed key set, optionally handing out a different one on refresh.
pub struct StaticKeySetFetcher {
    key_set: Arc<KeySet>,
    refreshed: Option<Arc<KeySet>>,
    pub fetches: AtomicUsize,
    pub refreshes: AtomicUsize,
}

impl StaticKeySetFetcher {
    pub fn new(key_set: KeySet) -> Self {
        Self {
            key_set: Arc::new(key_set),
            refreshed: None,
            fetches: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn rotating_to(mut self, key_set: KeySet) -> Self {
        self.refreshed = Some(Arc::new(key_set));
        self
    }
}

#[async_trait]
impl KeySetFetcher for StaticKeySetFetcher {
    async fn fetch(&self) -> Result<Arc<KeySet>, KeySetFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.key_set))
    }

    async fn refresh(&self) -> Result<Option<Arc<KeySet>>, KeySetFetchError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(self.refreshed.clone())
    }
}

/// Always fails, like an unreachable identity provider.
pub struct UnreachableKeySetFetcher;

#[async_trait]
impl KeySetFetcher for UnreachableKeySetFetcher {
    async fn fetch(&self) -> Result<Arc<KeySet>, KeySetFetchError> {
        Err(KeySetFetchError::Network {
            reason: "connection refused".to_string(),
        })
    }
}

pub fn validator() -> TokenValidator {
    TokenValidator::new(Arc::new(StaticKeySetFetcher::new(key_set())), CLIENT_ID)
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTodoStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(StaticKeySetFetcher::new(key_set())))
    }

    pub fn with_fetcher(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        let store = Arc::new(MemoryTodoStore::new("todos"));
        let validator = Arc::new(TokenValidator::new(fetcher, CLIENT_ID));
        let state = AppState::new(validator, Arc::clone(&store) as Arc<dyn TodoStore>);

        Self {
            router: build_router(state),
            store,
        }
    }
}

/// Authenticated request for `tenant` with an optional JSON body.
pub fn request(method: &str, tenant: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri("/")
        .header("Authorization", format!("Bearer {}", valid_token()))
        .header("X-Tenant-ID", tenant);

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
