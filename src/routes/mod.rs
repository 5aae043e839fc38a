pub mod analytics;
pub mod health;
pub mod model;
pub mod risk;
pub mod weather;

use std::sync::Arc;

use crate::services::scorer::RiskEngine;
use crate::services::weather::WeatherProvider;

/// Shared application state for all endpoints.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub provider: Arc<dyn WeatherProvider>,
    pub engine: RiskEngine,
    /// Lookahead window for alternative-date recommendations (days).
    pub lookahead_days: u32,
}
