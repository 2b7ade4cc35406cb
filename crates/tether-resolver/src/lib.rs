//! Link allocation, lookup and cleanup.
//!
//! [`ResolutionService`] ties a [`Generator`](tether_generator::Generator), a
//! durable [`Repository`](tether_core::Repository) and a
//! [`UrlCache`](tether_core::UrlCache) together. The store is the source of
//! truth; the cache is written after it and read in front of it.
//! [`CleanupSweeper`] purges expired rows on a fixed interval.

pub mod error;
pub mod resolver;
pub mod service;
pub mod sweeper;

pub use error::{ErrorKind, ResolveError, Result};
pub use resolver::Resolver;
pub use service::{CreateLink, ResolutionService, ResolverConfig, DEFAULT_MAX_GENERATION_ATTEMPTS};
pub use sweeper::{CleanupSweeper, SweeperHandle, MIN_SWEEP_INTERVAL};
