//! HTTP front end for the link resolver.
//!
//! Routes:
//! - `POST /api/url` creates a link,
//! - `GET /{code}` redirects to the link's target,
//! - `GET /health` reports liveness.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod validate;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
