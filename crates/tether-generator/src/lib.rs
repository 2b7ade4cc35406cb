//! Short code generators.
//!
//! Generators are pure: they never consult storage, so nothing they emit is
//! guaranteed unique. The resolver checks each candidate against the store.

pub mod random;
pub mod seq;

use tether_core::ShortCode;
use thiserror::Error;

pub use random::{GeneratorConfig, RandomGenerator, ALPHABET};
pub use seq::{SeqConfig, SeqGenerator, MAX_PREFIX_LEN};

/// Trait for generating short codes.
///
/// Implementations can vary from simple random generators to
/// distributed ID generators (e.g., Snowflake, UUID, etc.)
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Generates a candidate short code.
    fn generate(&self) -> Self::Output;
}

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("code length must be positive")]
    InvalidLength,

    #[error("invalid code prefix: {0}")]
    InvalidPrefix(String),
}
