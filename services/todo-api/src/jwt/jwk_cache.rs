//! Time-bounded key set cache with single-flight refresh.
//!
//! Reads are lock-free through `ArcSwap`. Only one upstream fetch runs at a
//! time: concurrent callers that find the cache stale wait on the refresh
//! mutex and then reuse whatever the winner stored.

use crate::jwt::jwks::{KeySet, KeySetFetchError, KeySetFetcher};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Minimum age before an unknown key id may trigger another upstream fetch.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

struct CacheEntry {
    key_set: Arc<KeySet>,
    fetched_at: Instant,
}

/// Caching decorator over any [`KeySetFetcher`].
pub struct CachedKeySetFetcher<F> {
    inner: F,
    entry: ArcSwapOption<CacheEntry>,
    ttl: Duration,
    refresh_cooldown: Duration,
    refresh_lock: Mutex<()>,
}

impl<F: KeySetFetcher> CachedKeySetFetcher<F> {
    /// Wraps `inner`, keeping each fetched key set for `ttl`.
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            entry: ArcSwapOption::empty(),
            ttl,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Overrides the unknown-key refresh cooldown.
    #[must_use]
    pub const fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Checks if the cache is empty or expired.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.fresh(self.ttl).is_none()
    }

    /// Gets the number of cached keys.
    #[must_use]
    pub fn cached_key_count(&self) -> usize {
        self.entry
            .load_full()
            .map_or(0, |entry| entry.key_set.len())
    }

    /// Drops the cached key set.
    pub fn invalidate(&self) {
        self.entry.store(None);
    }

    fn fresh(&self, max_age: Duration) -> Option<Arc<KeySet>> {
        self.entry
            .load_full()
            .filter(|entry| entry.fetched_at.elapsed() < max_age)
            .map(|entry| Arc::clone(&entry.key_set))
    }

    async fn fetch_and_store(&self) -> Result<Arc<KeySet>, KeySetFetchError> {
        let key_set = self.inner.fetch().await?;
        self.entry.store(Some(Arc::new(CacheEntry {
            key_set: Arc::clone(&key_set),
            fetched_at: Instant::now(),
        })));
        info!(keys = key_set.len(), "JWKS cache updated");
        Ok(key_set)
    }
}

#[async_trait]
impl<F: KeySetFetcher> KeySetFetcher for CachedKeySetFetcher<F> {
    async fn fetch(&self) -> Result<Arc<KeySet>, KeySetFetchError> {
        if let Some(key_set) = self.fresh(self.ttl) {
            return Ok(key_set);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(key_set) = self.fresh(self.ttl) {
            return Ok(key_set);
        }
        self.fetch_and_store().await
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<Option<Arc<KeySet>>, KeySetFetchError> {
        let _guard = self.refresh_lock.lock().await;
        if self.fresh(self.refresh_cooldown).is_some() {
            return Ok(None);
        }
        self.fetch_and_store().await.map(Some)
    }
}
