use crate::{Generator, GeneratorError};
use rand::Rng;
use tether_core::ShortCode;
use typed_builder::TypedBuilder;

/// The 62 case-sensitive symbols every generated code is drawn from.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Settings for [`RandomGenerator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct GeneratorConfig {
    /// Number of characters in every generated code.
    #[builder(default = 6)]
    pub code_length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Draws each character of a fixed-length code uniformly from [`ALPHABET`].
///
/// Collisions are possible and expected to be rare; the caller retries.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    code_length: usize,
}

impl RandomGenerator {
    /// Creates a generator from `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Holds the length of every generated code
    ///
    /// # Errors
    ///
    /// [`GeneratorError::InvalidLength`] when the length is zero.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        if config.code_length == 0 {
            return Err(GeneratorError::InvalidLength);
        }
        Ok(Self {
            code_length: config.code_length,
        })
    }

    /// Number of characters in every code this generator emits.
    pub fn code_length(&self) -> usize {
        self.code_length
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let mut rng = rand::rng();
        let code: String = (0..self.code_length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
