//! REST API handlers grouped by domain.

pub mod analytics;
pub mod qr;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult = Result<Json<Value>, ApiError>;

/// Detail shown for server-side failures; the cause only goes to the log.
pub const INTERNAL_ERROR_DETAIL: &str = "internal server error";

/// Standard error response: `{"detail": message}`.
pub fn err_json(status: u16, message: &str) -> ApiError {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "detail": message })),
    )
}
