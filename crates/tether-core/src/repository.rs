use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The short code that resolves to this link.
    pub code: ShortCode,
    /// The redirect target.
    pub original_url: String,
    /// The link resolves strictly before this instant and never after.
    pub expires_at: Timestamp,
    /// Whether the code was chosen by the caller rather than generated.
    pub is_custom: bool,
    pub created_at: Timestamp,
}

impl LinkRecord {
    /// A link is live iff `now < expires_at`.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    /// Remaining lifetime at `now`, or `None` once the link is no longer live.
    pub fn remaining_ttl(&self, now: Timestamp) -> Option<Duration> {
        if !self.is_live_at(now) {
            return None;
        }
        Duration::try_from(self.expires_at.duration_since(now)).ok()
    }
}

/// Parameters for persisting a new link.
///
/// The store stamps `created_at` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub code: ShortCode,
    pub original_url: String,
    pub expires_at: Timestamp,
    pub is_custom: bool,
}

/// A read-only view of the durable link store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Returns `true` if no record, live or expired-but-unpurged, holds `code`.
    async fn is_code_available(&self, code: &ShortCode) -> Result<bool>;

    /// Retrieves the live record for a given short code.
    /// Returns `None` if the code does not exist or has expired.
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;
}

/// The durable, authoritative link store.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Persists a new link and returns the stored record.
    ///
    /// Returns `Err(StorageError::Conflict)` if the code is already present.
    /// The check and the insert are a single atomic step.
    async fn create_link(&self, link: NewLink) -> Result<LinkRecord>;

    /// Deletes every record with `expires_at < cutoff`, returning how many
    /// rows were removed.
    async fn delete_expired(&self, cutoff: Timestamp) -> Result<u64>;
}
