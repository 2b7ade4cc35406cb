use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse};
use crate::state::AppState;
use crate::validate;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tether_core::ShortCode;
use tracing::debug;

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let create = validate::create_link(request)?;

    let record = state.resolver().create_link(create).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse {
            short_url: state.short_url(&record.code),
            expires_at: record.expires_at,
        }),
    ))
}

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // A string that is not a well-formed code cannot name a link.
    let Ok(code) = ShortCode::new(code) else {
        return Err(not_found());
    };

    match state.resolver().get_link(&code).await? {
        Some(record) => {
            debug!(code = %code, target = %record.original_url, "Redirecting");
            Ok((
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, record.original_url)],
            )
                .into_response())
        }
        None => Err(not_found()),
    }
}

fn not_found() -> AppError {
    AppError::NotFound("URL not found".to_string())
}
