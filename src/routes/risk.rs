//! Risk HTTP endpoints.
//!
//! - POST /api/v1/risk/analyze — score an event from current (or supplied)
//!   weather and return the full advisory result
//! - GET /api/v1/risk/history — previously stored analyses, filterable

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::AppState;
use crate::db::models::RiskAnalysis;
use crate::db::queries::{self, HistoryFilter, InsertAnalysisParams};
use crate::errors::{AppError, ErrorResponse};
use crate::services::advisor::{
    classify, find_alternative_date, suggestions, RiskCategory, ALTERNATIVE_RISK_THRESHOLD,
};
use crate::services::scorer::{EventDescriptor, RiskPrediction, Sport};
use crate::services::weather::WeatherOverride;

/// Default number of history rows returned.
const DEFAULT_HISTORY_LIMIT: i64 = 50;
/// Hard cap on history rows per request.
const MAX_HISTORY_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Analyze request body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisRequest {
    /// Sport name ("Cricket", "Football", "Tennis"; other names are scored
    /// with a neutral multiplier)
    pub sport: Option<String>,
    /// Event city
    pub city: Option<String>,
    /// Event datetime, ISO 8601
    pub datetime: Option<String>,
    /// Optional manual weather; absent fields take documented defaults
    #[serde(default)]
    pub weather: Option<WeatherOverride>,
}

/// Full advisory result for one event.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisResponse {
    #[serde(flatten)]
    pub prediction: RiskPrediction,
    /// Low / Moderate / High
    pub risk_category: RiskCategory,
    /// Recommended replacement date (ISO 8601); present only for
    /// high-risk events where a better day was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_date: Option<String>,
    /// Risk reduction in percentage points versus the analyzed date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reduction: Option<u8>,
    /// Ordered tactical suggestions, at most five
    pub tactical_suggestions: Vec<String>,
    /// When this analysis was produced (ISO 8601)
    pub timestamp: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Filter by sport name
    pub sport: Option<String>,
    /// Earliest event date, ISO 8601 datetime or YYYY-MM-DD
    pub from_date: Option<String>,
    /// Latest event date, ISO 8601 datetime or YYYY-MM-DD
    pub to_date: Option<String>,
    /// Maximum rows to return (default 50, capped at 200)
    pub limit: Option<i64>,
}

/// One stored analysis in the history view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskHistoryEntry {
    pub id: Uuid,
    pub sport: String,
    pub city: String,
    /// Event datetime (ISO 8601)
    pub event_time: String,
    pub performance_impact: i16,
    pub injury_probability: i16,
    pub disruption_probability: i16,
    pub overall_risk: i16,
    pub risk_category: String,
    /// When the analysis was stored (ISO 8601)
    pub created_at: String,
}

impl From<RiskAnalysis> for RiskHistoryEntry {
    fn from(record: RiskAnalysis) -> Self {
        Self {
            id: record.id,
            sport: record.sport,
            city: record.city,
            event_time: record.event_time.to_rfc3339(),
            performance_impact: record.performance_impact,
            injury_probability: record.injury_probability,
            disruption_probability: record.disruption_probability,
            overall_risk: record.overall_risk,
            risk_category: record.risk_category,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// History response with the total match count for pagination.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskHistoryResponse {
    pub data: Vec<RiskHistoryEntry>,
    pub total: i64,
    pub limit: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Analyze the weather risk for an event.
///
/// Fetches current weather for the city (unless the request supplies its
/// own), scores it through the model-or-formula pipeline, classifies the
/// overall score, derives tactical suggestions, and for high-risk events
/// searches the forecast for a lower-risk alternative date. The analysis
/// is stored for the history and analytics endpoints; a storage failure
/// is logged but does not fail the request.
#[utoipa::path(
    post,
    path = "/api/v1/risk/analyze",
    tag = "Risk",
    request_body = RiskAnalysisRequest,
    responses(
        (status = 200, description = "Risk analysis result", body = RiskAnalysisResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
    )
)]
pub async fn analyze_risk(
    State(state): State<AppState>,
    Json(request): Json<RiskAnalysisRequest>,
) -> Result<Json<RiskAnalysisResponse>, AppError> {
    let (sport_name, city, datetime) = match (&request.sport, &request.city, &request.datetime) {
        (Some(sport), Some(city), Some(datetime))
            if !sport.is_empty() && !city.is_empty() && !datetime.is_empty() =>
        {
            (sport.clone(), city.clone(), datetime.clone())
        }
        _ => {
            return Err(AppError::BadRequest(
                "Missing required fields: sport, city, datetime".to_string(),
            ))
        }
    };

    let starts_at: DateTime<Utc> = datetime
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid datetime: {}", e)))?;

    let weather = match &request.weather {
        Some(partial) => partial.resolve(&city),
        None => state.provider.current(&city),
    };

    let event = EventDescriptor {
        sport: Sport::parse(&sport_name),
        city: city.clone(),
        starts_at,
    };

    let prediction = state.engine.predict(&weather, &event).await;
    let risk_category = classify(prediction.overall_risk);
    let tactical_suggestions = suggestions(&prediction, &weather, event.sport);

    let alternative = if prediction.overall_risk > ALTERNATIVE_RISK_THRESHOLD {
        find_alternative_date(
            state.provider.as_ref(),
            &state.engine,
            &event,
            prediction.overall_risk,
            state.lookahead_days,
        )
        .await
    } else {
        None
    };

    // Storage is best-effort: the advisory result is still valid when the
    // database is down.
    let insert = queries::insert_analysis(
        &state.pool,
        InsertAnalysisParams {
            sport: sport_name.clone(),
            city: city.clone(),
            event_time: starts_at,
            temperature: weather.temperature,
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            rain_probability: weather.rain_probability,
            aqi: weather.aqi,
            performance_impact: prediction.performance_impact as i16,
            injury_probability: prediction.injury_probability as i16,
            disruption_probability: prediction.disruption_probability as i16,
            overall_risk: prediction.overall_risk as i16,
            risk_category: risk_category.as_str().to_string(),
        },
    )
    .await;
    if let Err(e) = insert {
        tracing::warn!("Failed to persist risk analysis: {}", e);
    }

    tracing::info!("Risk analysis completed for {} in {}", sport_name, city);

    Ok(Json(RiskAnalysisResponse {
        prediction,
        risk_category,
        recommended_date: alternative.as_ref().map(|a| a.date.to_rfc3339()),
        risk_reduction: alternative.as_ref().map(|a| a.risk_reduction),
        tactical_suggestions,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// List stored risk analyses.
///
/// Supports filtering by sport and event-date range; date bounds accept a
/// full ISO 8601 datetime or a plain `YYYY-MM-DD` (interpreted as the
/// start or end of that day in UTC).
#[utoipa::path(
    get,
    path = "/api/v1/risk/history",
    tag = "Risk",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Stored analyses, newest first", body = RiskHistoryResponse),
        (status = 400, description = "Invalid date filter", body = ErrorResponse),
    )
)]
pub async fn get_risk_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<RiskHistoryResponse>, AppError> {
    let from_date = parse_date_bound(params.from_date.as_deref(), false)?;
    let to_date = parse_date_bound(params.to_date.as_deref(), true)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let filter = HistoryFilter {
        sport: params.sport,
        from_date,
        to_date,
        limit,
    };

    let records = queries::get_analysis_history(&state.pool, &filter).await?;
    let total = queries::count_analyses(&state.pool, &filter).await?;
    let data: Vec<RiskHistoryEntry> = records.into_iter().map(RiskHistoryEntry::from).collect();

    Ok(Json(RiskHistoryResponse { data, total, limit }))
}

/// Parse a history date filter. Accepts RFC 3339 datetimes and plain
/// dates; a plain date maps to 00:00:00 (lower bound) or 23:59:59 (upper
/// bound) UTC.
fn parse_date_bound(
    value: Option<&str>,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = value else {
        return Ok(None);
    };

    if let Ok(datetime) = raw.parse::<DateTime<Utc>>() {
        return Ok(Some(datetime));
    }

    let date: NaiveDate = raw
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid date filter '{}': {}", raw, e)))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    Ok(time.map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_date_bound_none() {
        assert_eq!(parse_date_bound(None, false).unwrap(), None);
    }

    #[test]
    fn test_parse_date_bound_rfc3339() {
        let parsed = parse_date_bound(Some("2026-06-15T14:30:00Z"), false)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_date_bound_plain_date_lower() {
        let parsed = parse_date_bound(Some("2026-06-15"), false).unwrap().unwrap();
        assert_eq!(parsed.hour(), 0);
        assert_eq!(parsed.minute(), 0);
    }

    #[test]
    fn test_parse_date_bound_plain_date_upper() {
        let parsed = parse_date_bound(Some("2026-06-15"), true).unwrap().unwrap();
        assert_eq!(parsed.hour(), 23);
        assert_eq!(parsed.minute(), 59);
    }

    #[test]
    fn test_parse_date_bound_invalid() {
        assert!(parse_date_bound(Some("not-a-date"), false).is_err());
    }
}
