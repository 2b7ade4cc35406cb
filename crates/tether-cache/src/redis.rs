use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tether_core::cache::Result;
use tether_core::{CacheError, LinkRecord, ShortCode, UrlCache};
use tracing::{debug, trace};

const DEFAULT_KEY_PREFIX: &str = "tether:url:";

/// Link records stored in Redis as JSON strings.
///
/// Each value is written with `SET key value PX ttl`, so expiry keeps
/// millisecond precision. Keys are `<prefix><code>`.
#[derive(Clone)]
pub struct RedisUrlCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisUrlCache {
    /// Creates a cache using the default `tether:url:` key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a cache that namespaces its keys under `key_prefix`.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Prepended to every code, e.g. "staging:url:"
    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and establishes a multiplexed connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| classify("connect", e))?;
        debug!("Connected to Redis");
        Ok(Self::new(conn))
    }

    fn key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code)
    }
}

impl std::fmt::Debug for RedisUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisUrlCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn classify(command: &str, err: RedisError) -> CacheError {
    let message = format!("redis {command}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let key = self.key(code);
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn.get(&key).await.map_err(|e| classify("GET", e))?;
        let Some(raw) = raw else {
            trace!(code = %code, "Redis miss");
            return Ok(None);
        };

        let record = serde_json::from_str::<LinkRecord>(&raw)
            .map_err(|e| CacheError::InvalidData(format!("undecodable value at '{key}': {e}")))?;
        trace!(code = %code, "Redis hit");
        Ok(Some(record))
    }

    async fn set_url(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> Result<()> {
        // PX rejects zero; less than a millisecond left is as good as expired.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if ttl_ms == 0 {
            trace!(code = %code, "Skipping Redis write for sub-millisecond TTL");
            return Ok(());
        }

        let payload = serde_json::to_string(record)
            .map_err(|e| CacheError::Serialization(format!("encode record '{code}': {e}")))?;

        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(self.key(code), payload, ttl_ms)
            .await
            .map_err(|e| classify("SET PX", e))?;
        trace!(code = %code, ttl_ms, "Stored record in Redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(code))
            .await
            .map_err(|e| classify("DEL", e))?;
        trace!(code = %code, "Removed record from Redis");
        Ok(())
    }
}

// Tests that need a running Redis live in tests/redis_cache_integration.rs.
