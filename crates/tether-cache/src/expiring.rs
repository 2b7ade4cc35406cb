//! Expiry policy for cached links.
//!
//! A backend's own TTL and a record's logical `expires_at` can drift apart
//! (clock skew between hosts, coarse TTL resolution, a backend that ignores
//! TTLs entirely). [`ExpiringCache`] closes that gap on both sides:
//!
//! - writes: a record that is already dead is never stored, and the TTL is
//!   capped at the record's remaining lifetime;
//! - reads: a record past `expires_at` is deleted from the backend and
//!   reported as a miss.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tether_core::cache::Result;
use tether_core::{Clock, LinkRecord, ShortCode, SystemClock, UrlCache};
use tracing::{debug, trace, warn};

/// A cache decorator that enforces link liveness on every read and write.
pub struct ExpiringCache<C> {
    inner: C,
    clock: Arc<dyn Clock>,
}

impl<C: UrlCache> ExpiringCache<C> {
    /// Wraps `inner`, reading time from the system clock.
    pub fn new(inner: C) -> Self {
        Self::with_clock(inner, SystemClock)
    }

    /// Wraps `inner`, reading `now` from `clock`.
    pub fn with_clock(inner: C, clock: impl Clock) -> Self {
        Self {
            inner,
            clock: Arc::new(clock),
        }
    }

    /// Returns a reference to the wrapped backend.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Caches `record` for exactly its remaining lifetime.
    ///
    /// Returns `false` without touching the backend when the record is
    /// already expired.
    pub async fn cache_link(&self, record: &LinkRecord) -> Result<bool> {
        let Some(ttl) = record.remaining_ttl(self.clock.now()) else {
            debug!(code = %record.code, "Refusing to cache expired record");
            return Ok(false);
        };
        self.inner.set_url(&record.code, record, ttl).await?;
        Ok(true)
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for ExpiringCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: UrlCache> UrlCache for ExpiringCache<C> {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let Some(record) = self.inner.get_url(code).await? else {
            return Ok(None);
        };

        if record.is_live_at(self.clock.now()) {
            return Ok(Some(record));
        }

        trace!(code = %code, expires_at = %record.expires_at, "Evicting stale cache entry");
        // The stale entry is filtered on every read anyway, so a failed
        // eviction only costs a retry on the next lookup.
        if let Err(e) = self.inner.del(code).await {
            warn!(code = %code, error = %e, "Failed to evict stale cache entry");
        }
        Ok(None)
    }

    async fn set_url(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> Result<()> {
        let Some(remaining) = record.remaining_ttl(self.clock.now()) else {
            debug!(code = %code, "Refusing to cache expired record");
            return Ok(());
        };
        self.inner.set_url(code, record, ttl.min(remaining)).await
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.inner.del(code).await
    }
}
