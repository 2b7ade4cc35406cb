use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tether_core::cache::Result;
use tether_core::{LinkRecord, ShortCode, UrlCache};
use tracing::trace;
use typed_builder::TypedBuilder;

/// A cached record together with the TTL it was stored with.
#[derive(Debug, Clone)]
struct Entry {
    record: LinkRecord,
    ttl: Duration,
}

/// Per-entry expiry: every insert, including a re-insert of an existing
/// key, lives exactly as long as the TTL it was written with.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process link cache backed by `moka`.
///
/// For single-node runs and tests. When full, moka evicts entries before
/// their TTL; readers then fall through to the store.
#[derive(Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, Entry>,
}

impl MokaUrlCache {
    /// Holds up to 10,000 entries.
    pub fn new() -> Self {
        CacheConfig::default().into()
    }

    /// Creates a cache bounded to `max_capacity` entries.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Entry count past which moka starts evicting
    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder().max_capacity(max_capacity).build().into()
    }

    /// Starts a [`CacheConfig`]; finish with `.build().into()`.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Number of entries currently held. Pending expirations may still be
    /// counted until moka runs its maintenance.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MokaUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaUrlCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let hit = self.cache.get(code.as_str()).await.map(|entry| entry.record);
        trace!(code = %code, hit = hit.is_some(), "Moka lookup");
        Ok(hit)
    }

    async fn set_url(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> Result<()> {
        let entry = Entry {
            record: record.clone(),
            ttl,
        };
        self.cache.insert(code.as_str().to_owned(), entry).await;
        trace!(code = %code, ?ttl, "Stored record in Moka");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.cache.invalidate(code.as_str()).await;
        trace!(code = %code, "Invalidated Moka entry");
        Ok(())
    }
}

/// Settings for [`MokaUrlCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheConfig {
    /// Entry count above which moka starts evicting.
    #[builder(default = 10_000)]
    max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();
        MokaUrlCache { cache }
    }
}
