use crate::{Generator, GeneratorError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tether_core::shortcode::MAX_LENGTH;
use tether_core::ShortCode;
use typed_builder::TypedBuilder;

const COUNTER_WIDTH: usize = 6;
// u64::MAX is 20 decimal digits.
const MAX_COUNTER_DIGITS: usize = 20;

/// Longest prefix that still leaves room for any counter value.
pub const MAX_PREFIX_LEN: usize = MAX_LENGTH - MAX_COUNTER_DIGITS;

/// Settings for [`SeqGenerator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct SeqConfig {
    /// ASCII letters and digits put in front of every counter value.
    #[builder(setter(into))]
    pub prefix: String,
    /// First counter value handed out.
    #[builder(default)]
    pub start: u64,
}

/// Emits `<prefix><counter>` codes, the counter zero-padded to six digits.
///
/// Predictable codes make local runs easy to poke at by hand. The counter is
/// not persisted: after a restart against a durable store, pick a `start`
/// past the codes already handed out or every candidate collides.
///
/// Clones share one counter, so they never hand out the same code twice.
#[derive(Debug, Clone)]
pub struct SeqGenerator {
    prefix: Arc<str>,
    next: Arc<AtomicU64>,
}

impl SeqGenerator {
    /// Creates a generator from `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - The prefix and first counter value
    ///
    /// # Errors
    ///
    /// [`GeneratorError::InvalidPrefix`] when the prefix holds anything but
    /// ASCII letters and digits, or is longer than [`MAX_PREFIX_LEN`].
    pub fn new(config: SeqConfig) -> Result<Self, GeneratorError> {
        let SeqConfig { prefix, start } = config;
        if !prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(GeneratorError::InvalidPrefix(format!(
                "'{prefix}' must contain only ASCII letters and digits"
            )));
        }
        if prefix.len() > MAX_PREFIX_LEN {
            return Err(GeneratorError::InvalidPrefix(format!(
                "'{prefix}' is longer than {MAX_PREFIX_LEN} characters"
            )));
        }
        Ok(Self {
            prefix: prefix.into(),
            next: Arc::new(AtomicU64::new(start)),
        })
    }

    /// Shorthand for a generator counting up from zero.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, GeneratorError> {
        Self::new(SeqConfig::builder().prefix(prefix).build())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        // Prefix checked in `new`; the result is at most MAX_LENGTH alphanumerics.
        ShortCode::new_unchecked(format!(
            "{}{:0width$}",
            self.prefix,
            n,
            width = COUNTER_WIDTH
        ))
    }
}
