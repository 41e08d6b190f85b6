//! Read-only analytics API.

use analytics_db::Timeframe;
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;

use crate::app::SharedState;
use crate::services::analytics::AnalyticsError;

use super::{ApiError, ApiResult, INTERNAL_ERROR_DETAIL, err_json};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub timeframe: Option<String>,
}

/// GET /analytics/total
pub async fn get_total(State(state): State<SharedState>) -> ApiResult {
    let total = state.analytics().total().await.map_err(internal)?;
    Ok(Json(json!({ "total_qr_codes": total })))
}

/// GET /analytics/period?timeframe=today|month|year
pub async fn get_period(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult {
    let timeframe: Timeframe = query
        .timeframe
        .as_deref()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| err_json(400, "invalid input"))?;

    let period = state
        .analytics()
        .period(timeframe)
        .await
        .map_err(internal)?;
    Ok(Json(json!(period)))
}

/// GET /analytics/features
pub async fn get_features(State(state): State<SharedState>) -> ApiResult {
    let stats = state.analytics().features().await.map_err(internal)?;
    Ok(Json(json!(stats)))
}

fn internal(e: AnalyticsError) -> ApiError {
    tracing::error!("Analytics query failed: {e}");
    err_json(500, INTERNAL_ERROR_DETAIL)
}
