use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("'{0}' is not a valid short code")]
    InvalidShortCode(String),
}

/// Failures reported by a [`UrlCache`](crate::UrlCache) backend.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Unavailable(String),
    #[error("cache timed out: {0}")]
    Timeout(String),
    #[error("could not encode cache entry: {0}")]
    Serialization(String),
    #[error("corrupt cache entry: {0}")]
    InvalidData(String),
    #[error("could not set up cache: {0}")]
    Initialization(String),
    #[error("cache command failed: {0}")]
    Operation(String),
}

/// Failures reported by a [`Repository`](crate::Repository).
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The short code is already taken. Raised by the store's uniqueness
    /// check, so it is safe under concurrent inserts.
    #[error("short code '{0}' is taken")]
    Conflict(String),
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("store timed out: {0}")]
    Timeout(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("corrupt stored row: {0}")]
    InvalidData(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}
