use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{AnalyticsAggregates, RiskAnalysis};

/// Parameters for inserting an analysis record.
pub struct InsertAnalysisParams {
    pub sport: String,
    pub city: String,
    pub event_time: DateTime<Utc>,
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
}

/// Filters for the history endpoint. `None` means "no filter".
pub struct HistoryFilter {
    pub sport: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: i64,
}

/// Insert a new analysis record (append-only).
pub async fn insert_analysis(
    pool: &PgPool,
    params: InsertAnalysisParams,
) -> Result<RiskAnalysis, sqlx::Error> {
    sqlx::query_as::<_, RiskAnalysis>(
        "INSERT INTO risk_analyses (
            id, sport, city, event_time,
            temperature, humidity, wind_speed, rain_probability, aqi,
            performance_impact, injury_probability, disruption_probability,
            overall_risk, risk_category, created_at
        ) VALUES (
            $1, $2, $3, $4,
            $5, $6, $7, $8, $9,
            $10, $11, $12, $13, $14, NOW()
        )
        RETURNING id, sport, city, event_time,
                  temperature, humidity, wind_speed, rain_probability, aqi,
                  performance_impact, injury_probability, disruption_probability,
                  overall_risk, risk_category, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&params.sport)
    .bind(&params.city)
    .bind(params.event_time)
    .bind(params.temperature)
    .bind(params.humidity)
    .bind(params.wind_speed)
    .bind(params.rain_probability)
    .bind(params.aqi)
    .bind(params.performance_impact)
    .bind(params.injury_probability)
    .bind(params.disruption_probability)
    .bind(params.overall_risk)
    .bind(&params.risk_category)
    .fetch_one(pool)
    .await
}

/// Stored analyses matching the filter, newest first.
pub async fn get_analysis_history(
    pool: &PgPool,
    filter: &HistoryFilter,
) -> Result<Vec<RiskAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, RiskAnalysis>(
        "SELECT id, sport, city, event_time,
                temperature, humidity, wind_speed, rain_probability, aqi,
                performance_impact, injury_probability, disruption_probability,
                overall_risk, risk_category, created_at
         FROM risk_analyses
         WHERE ($1::text IS NULL OR sport = $1)
           AND ($2::timestamptz IS NULL OR event_time >= $2)
           AND ($3::timestamptz IS NULL OR event_time <= $3)
         ORDER BY created_at DESC
         LIMIT $4",
    )
    .bind(&filter.sport)
    .bind(filter.from_date)
    .bind(filter.to_date)
    .bind(filter.limit)
    .fetch_all(pool)
    .await
}

/// Total number of analyses matching the filter (ignores the limit).
pub async fn count_analyses(pool: &PgPool, filter: &HistoryFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM risk_analyses
         WHERE ($1::text IS NULL OR sport = $1)
           AND ($2::timestamptz IS NULL OR event_time >= $2)
           AND ($3::timestamptz IS NULL OR event_time <= $3)",
    )
    .bind(&filter.sport)
    .bind(filter.from_date)
    .bind(filter.to_date)
    .fetch_one(pool)
    .await
}

/// Aggregate metrics over every stored analysis.
pub async fn get_analytics(pool: &PgPool) -> Result<AnalyticsAggregates, sqlx::Error> {
    sqlx::query_as::<_, AnalyticsAggregates>(
        "SELECT COUNT(*) AS total_predictions,
                COALESCE(AVG(overall_risk), 0)::float8 AS average_risk,
                COUNT(*) FILTER (WHERE risk_category = 'High') AS high_risk_events,
                COUNT(*) FILTER (WHERE risk_category = 'Moderate') AS moderate_risk_events,
                COUNT(*) FILTER (WHERE risk_category = 'Low') AS low_risk_events
         FROM risk_analyses",
    )
    .fetch_one(pool)
    .await
}
