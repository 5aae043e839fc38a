//! Predictive model lifecycle endpoints.
//!
//! - GET /api/v1/model/status — whether a model is loaded and since when
//! - POST /api/v1/model/reload — re-read the artifact from disk

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;
use crate::services::model::ModelStatus;

/// Model status response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatusResponse {
    /// Whether a predictive model is currently loaded
    pub loaded: bool,
    /// Artifact path the handle loads from
    pub path: String,
    /// When the current model was loaded (ISO 8601); absent in fallback mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
}

impl From<ModelStatus> for ModelStatusResponse {
    fn from(status: ModelStatus) -> Self {
        Self {
            loaded: status.loaded,
            path: status.path,
            loaded_at: status.loaded_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Current model status.
#[utoipa::path(
    get,
    path = "/api/v1/model/status",
    tag = "Model",
    responses(
        (status = 200, description = "Model status", body = ModelStatusResponse),
    )
)]
pub async fn get_model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    Json(state.engine.model().status().await.into())
}

/// Reload the model artifact from disk.
///
/// A failed reload clears the handle and the pipeline runs on the formula
/// fallback; the response reports the resulting state either way.
#[utoipa::path(
    post,
    path = "/api/v1/model/reload",
    tag = "Model",
    responses(
        (status = 200, description = "Model state after the reload attempt", body = ModelStatusResponse),
    )
)]
pub async fn reload_model(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    if let Err(e) = state.engine.model().load().await {
        tracing::warn!("Model reload failed, running on formula fallback: {}", e);
    }
    Json(state.engine.model().status().await.into())
}
