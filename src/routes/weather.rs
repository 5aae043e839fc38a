//! Weather HTTP endpoints.
//!
//! - GET /api/v1/weather/current/{city}
//! - GET /api/v1/weather/forecast/{city}?days=N

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use super::AppState;
use crate::errors::{AppError, ErrorResponse};
use crate::services::weather::WeatherObservation;

/// Default forecast length in days.
const DEFAULT_FORECAST_DAYS: u32 = 3;
/// Maximum forecast length the endpoint will serve.
const MAX_FORECAST_DAYS: u32 = 14;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastQuery {
    /// Number of days to forecast (default 3, max 14)
    pub days: Option<u32>,
}

/// Current weather conditions for a city.
#[utoipa::path(
    get,
    path = "/api/v1/weather/current/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "City name"),
    ),
    responses(
        (status = 200, description = "Current conditions", body = WeatherObservation),
        (status = 400, description = "Missing city", body = ErrorResponse),
    )
)]
pub async fn get_current_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<WeatherObservation>, AppError> {
    if city.trim().is_empty() {
        return Err(AppError::BadRequest("City parameter is required".to_string()));
    }
    Ok(Json(state.provider.current(&city)))
}

/// Daily weather forecast for a city.
#[utoipa::path(
    get,
    path = "/api/v1/weather/forecast/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "City name"),
        ForecastQuery,
    ),
    responses(
        (status = 200, description = "One observation per forecast day", body = Vec<WeatherObservation>),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
    )
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<Vec<WeatherObservation>>, AppError> {
    if city.trim().is_empty() {
        return Err(AppError::BadRequest("City parameter is required".to_string()));
    }

    let days = params.days.unwrap_or(DEFAULT_FORECAST_DAYS);
    if days == 0 || days > MAX_FORECAST_DAYS {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_FORECAST_DAYS
        )));
    }

    Ok(Json(state.provider.forecast(&city, days)))
}
