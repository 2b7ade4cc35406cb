use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tether_resolver::{ErrorKind, ResolveError};
use thiserror::Error;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e.kind() {
            ErrorKind::Validation => AppError::Validation(e.to_string()),
            ErrorKind::Conflict => AppError::Conflict(e.to_string()),
            ErrorKind::GenerationExhausted => {
                error!(error = %e, "Short code space exhausted");
                AppError::Internal(e.to_string())
            }
            ErrorKind::Internal => {
                // Backend details stay in the logs.
                error!(error = %e, "Resolver failure");
                AppError::Internal("internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ShortCode, StorageError};

    #[test]
    fn resolver_errors_map_to_status_classes() {
        let code = ShortCode::new_unchecked("abc123");

        let conflict: AppError = ResolveError::Conflict(code.clone()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let exhausted: AppError = ResolveError::GenerationExhausted { attempts: 5 }.into();
        assert_eq!(exhausted.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let invalid: AppError = ResolveError::InvalidExpiration("overflow".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let storage: AppError = ResolveError::Storage {
            operation: "get_by_code",
            code: Some(code),
            source: StorageError::Unavailable("db down".to_string()),
        }
        .into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.to_string(), "internal server error");
    }
}
