use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored risk analysis, one row per analyze request.
/// Scores are SMALLINT in Postgres; the domain range is 0–100.
#[derive(Debug, Clone, FromRow)]
pub struct RiskAnalysis {
    pub id: Uuid,
    pub sport: String,
    pub city: String,
    pub event_time: DateTime<Utc>,

    // Weather inputs the scores were computed from
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rain_probability: f64,
    pub aqi: f64,

    pub performance_impact: i16,
    pub injury_probability: i16,
    pub disruption_probability: i16,
    pub overall_risk: i16,
    pub risk_category: String,

    pub created_at: DateTime<Utc>,
}

/// Aggregates over all stored analyses, for the analytics endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsAggregates {
    pub total_predictions: i64,
    pub average_risk: f64,
    pub high_risk_events: i64,
    pub moderate_risk_events: i64,
    pub low_risk_events: i64,
}
