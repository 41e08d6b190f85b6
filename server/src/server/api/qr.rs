//! QR code generation API.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::Response;

use crate::app::SharedState;
use crate::services::pipeline::PipelineError;
use crate::services::request::QrRequest;

use super::{ApiError, INTERNAL_ERROR_DETAIL, err_json};

/// POST /generate-qr/
pub async fn generate_qr(
    State(state): State<SharedState>,
    payload: Result<Json<QrRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // Unparseable bodies are reported as 422 like field errors.
    let Json(body) = payload.map_err(|e| err_json(422, &e.body_text()))?;

    let generated = state
        .pipeline()
        .run(body)
        .await
        .map_err(|e| pipeline_error_response(&e))?;

    tracing::info!(
        has_color = generated.has_color,
        has_logo = generated.has_logo,
        box_size = generated.box_size,
        width = generated.width,
        bytes = generated.png.len(),
        elapsed_ms = generated.elapsed_ms(),
        "Generated QR code"
    );

    state.analytics().record_detached(generated.record());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(generated.png))
        .map_err(|e| {
            tracing::error!("Failed to build PNG response: {e}");
            err_json(500, INTERNAL_ERROR_DETAIL)
        })
}

fn pipeline_error_response(e: &PipelineError) -> ApiError {
    let status = e.status_code();
    if status >= 500 {
        tracing::error!(stage = ?e.failed_at(), "QR generation failed: {e}");
        return err_json(500, INTERNAL_ERROR_DETAIL);
    }
    tracing::warn!(
        stage = ?e.failed_at(),
        status,
        upstream_status = ?e.upstream_status(),
        "QR generation rejected: {e}"
    );
    err_json(status, &e.to_string())
}
