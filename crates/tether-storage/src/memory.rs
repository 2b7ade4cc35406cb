use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::sync::Arc;
use tether_core::repository::{LinkRecord, NewLink, ReadRepository, Repository, Result};
use tether_core::{Clock, ShortCode, StorageError, SystemClock};
use tracing::{debug, trace};

/// In-memory implementation of the repository contract using DashMap.
///
/// Clones share the same map. DashMap's sharded locks let reads and writes
/// to different codes proceed without blocking each other, and its entry
/// API makes check-and-insert a single atomic step, which is what gives
/// custom codes their race-safe uniqueness.
#[derive(Clone)]
pub struct InMemoryRepository {
    storage: Arc<DashMap<String, LinkRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository reading time from the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a new in-memory repository that reads `now` from `clock`.
    pub fn with_clock(clock: impl Clock) -> Self {
        Self {
            storage: Arc::new(DashMap::new()),
            clock: Arc::new(clock),
        }
    }

    /// Number of stored records, expired-but-unpurged ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("len", &self.storage.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn is_code_available(&self, code: &ShortCode) -> Result<bool> {
        Ok(!self.storage.contains_key(code.as_str()))
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let now = self.clock.now();
        let record = self
            .storage
            .get(code.as_str())
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.value().clone());
        Ok(record)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_link(&self, link: NewLink) -> Result<LinkRecord> {
        let record = LinkRecord {
            code: link.code,
            original_url: link.original_url,
            expires_at: link.expires_at,
            is_custom: link.is_custom,
            created_at: self.clock.now(),
        };

        match self.storage.entry(record.code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.code.to_string())),
            Entry::Vacant(slot) => {
                trace!(code = %record.code, "inserted link");
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn delete_expired(&self, cutoff: Timestamp) -> Result<u64> {
        let mut removed = 0_u64;
        self.storage.retain(|_, record| {
            let keep = record.expires_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        debug!(removed, "purged expired links");
        Ok(removed)
    }
}
