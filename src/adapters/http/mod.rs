//! HTTP adapters - the REST surface.
//!
//! One module per resource; `api_router` composes them over the shared
//! `AppState`. Provider error detail is logged here, never sent to callers.

mod conversation;
mod health;
mod history;
mod preferences;
mod sms;
mod state;
mod users;

pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Error body matching the `{"detail": ...}` wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

pub(crate) fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(ErrorBody::new(detail))).into_response()
}

pub(crate) fn not_found(detail: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, detail)
}

pub(crate) fn bad_request(detail: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, detail)
}

pub(crate) fn internal_error(detail: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
}

/// Generic outward message for provider failures; the real cause stays in
/// the logs.
pub(crate) fn service_unavailable() -> Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "AI service temporarily unavailable",
    )
}

#[derive(Debug, Serialize)]
struct BannerResponse {
    message: &'static str,
    version: &'static str,
}

async fn root_banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Welcome to Replyline",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_banner))
        .merge(health::routes())
        .nest("/users", users::routes())
        .nest("/preferences", preferences::routes())
        .nest("/conversation", conversation::routes())
        .nest("/sms", sms::routes())
        .nest("/history", history::routes())
        .with_state(state)
}
