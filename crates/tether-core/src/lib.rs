//! Core types and traits for the Tether link shortener.
//!
//! This crate holds the link model, the short code type and the narrow
//! storage and cache contracts that the resolver is written against.

pub mod cache;
pub mod clock;
pub mod error;
pub mod repository;
pub mod shortcode;

pub use cache::UrlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CoreError, StorageError};
pub use repository::{LinkRecord, NewLink, ReadRepository, Repository};
pub use shortcode::ShortCode;
