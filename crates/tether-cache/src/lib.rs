//! Cache backends and the expiry policy that sits in front of them.
//!
//! Backends ([`MokaUrlCache`], [`RedisUrlCache`]) only store what they are
//! given for as long as they are told. [`ExpiringCache`] wraps any backend
//! and makes sure a dead link is never stored and never served.

pub mod expiring;
pub mod moka;
pub mod redis;

pub use expiring::ExpiringCache;
pub use moka::{CacheConfig, MokaUrlCache};
pub use redis::RedisUrlCache;
pub use tether_core::cache::{Result, UrlCache};
pub use tether_core::CacheError;
