//! Analytics endpoint: aggregate metrics over stored analyses.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;
use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};

/// Aggregate prediction metrics.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    /// Total number of stored analyses
    pub total_predictions: i64,
    /// Mean overall risk across all analyses (0 when none exist)
    pub average_risk_score: f64,
    pub high_risk_events: i64,
    pub moderate_risk_events: i64,
    pub low_risk_events: i64,
}

/// Aggregate metrics over every stored risk analysis.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/metrics",
    tag = "Analytics",
    responses(
        (status = 200, description = "Aggregate prediction metrics", body = AnalyticsResponse),
        (status = 500, description = "Database unavailable", body = ErrorResponse),
    )
)]
pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<AnalyticsResponse>, AppError> {
    let aggregates = queries::get_analytics(&state.pool).await?;
    Ok(Json(AnalyticsResponse {
        total_predictions: aggregates.total_predictions,
        average_risk_score: aggregates.average_risk,
        high_risk_events: aggregates.high_risk_events,
        moderate_risk_events: aggregates.moderate_risk_events,
        low_risk_events: aggregates.low_risk_events,
    }))
}
