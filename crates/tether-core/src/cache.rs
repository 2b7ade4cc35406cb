use crate::error::CacheError;
use crate::repository::LinkRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A cache for link records.
///
/// This trait is the raw backend contract, keyed by [`ShortCode`].
/// Implementations can use Redis, in-memory caches, or other storage
/// backends. Expiry policy (refusing dead records, evicting on read) is
/// layered on top by the caller and is not the backend's concern.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get link record from cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Store link record in cache for at most `ttl`.
    async fn set_url(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> Result<()>;

    /// Remove link record from cache.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}
