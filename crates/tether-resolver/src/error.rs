use tether_core::{CacheError, ShortCode, StorageError};
use thiserror::Error;

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors returned by [`ResolutionService`](crate::ResolutionService).
///
/// A missing or expired link is not an error; lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("short code '{0}' is already taken")]
    Conflict(ShortCode),

    #[error("could not find a free short code after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),

    #[error("storage failure during {operation}{}: {source}", for_code(.code.as_ref()))]
    Storage {
        operation: &'static str,
        code: Option<ShortCode>,
        #[source]
        source: StorageError,
    },

    #[error("cache failure during {operation} for '{code}': {source}")]
    Cache {
        operation: &'static str,
        code: ShortCode,
        #[source]
        source: CacheError,
    },
}

fn for_code(code: Option<&ShortCode>) -> String {
    code.map(|c| format!(" for '{c}'")).unwrap_or_default()
}

/// Coarse classification of a [`ResolveError`], used by transports to pick
/// a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    GenerationExhausted,
    Internal,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Conflict(_) => ErrorKind::Conflict,
            ResolveError::GenerationExhausted { .. } => ErrorKind::GenerationExhausted,
            ResolveError::InvalidExpiration(_) => ErrorKind::Validation,
            ResolveError::Storage { .. } | ResolveError::Cache { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn storage(
        operation: &'static str,
        code: Option<&ShortCode>,
    ) -> impl FnOnce(StorageError) -> ResolveError {
        let code = code.cloned();
        move |source| ResolveError::Storage {
            operation,
            code,
            source,
        }
    }

    pub(crate) fn cache(
        operation: &'static str,
        code: &ShortCode,
    ) -> impl FnOnce(CacheError) -> ResolveError {
        let code = code.clone();
        move |source| ResolveError::Cache {
            operation,
            code,
            source,
        }
    }
}
