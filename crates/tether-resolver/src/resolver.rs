use crate::error::Result;
use crate::service::CreateLink;
use async_trait::async_trait;
use tether_core::{LinkRecord, ShortCode};

/// The link operations exposed to transports and background jobs.
///
/// Lets callers hold a resolver as `Arc<dyn Resolver>` without naming the
/// store, cache and generator types it was assembled from.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Allocates a code and persists a new link.
    async fn create_link(&self, request: CreateLink) -> Result<LinkRecord>;

    /// Returns the live link for `code`, or `None` if there is none.
    async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Purges expired links from the durable store.
    async fn cleanup(&self) -> Result<u64>;
}
