use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::api;
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        // --- Generation ---
        .route("/generate-qr/", post(api::qr::generate_qr))
        // --- Analytics ---
        .route("/analytics/total", get(api::analytics::get_total))
        .route("/analytics/period", get(api::analytics::get_period))
        .route("/analytics/features", get(api::analytics::get_features))
        // --- Middleware ---
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
