// MatchRisk API v0.1
use axum::http::Method;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;
use services::model::ModelHandle;
use services::scorer::RiskEngine;
use services::weather::MockWeatherProvider;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// MatchRisk API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MatchRisk API",
        version = "0.1.0",
        description = "Weather-driven risk advisory API for outdoor sports events. \
            Scores a sport/city/date combination against current or forecast weather, \
            classifies the overall risk, derives tactical suggestions, and recommends \
            a lower-risk alternative date for high-risk events.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Risk", description = "Risk analysis and stored history"),
        (name = "Weather", description = "Current conditions and daily forecasts"),
        (name = "Model", description = "Predictive model lifecycle"),
        (name = "Analytics", description = "Aggregate prediction metrics"),
    ),
    paths(
        routes::health::health_check,
        routes::risk::analyze_risk,
        routes::risk::get_risk_history,
        routes::weather::get_current_weather,
        routes::weather::get_forecast,
        routes::model::get_model_status,
        routes::model::reload_model,
        routes::analytics::get_metrics,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::risk::RiskAnalysisRequest,
            routes::risk::RiskAnalysisResponse,
            routes::risk::RiskHistoryEntry,
            routes::risk::RiskHistoryResponse,
            routes::analytics::AnalyticsResponse,
            routes::model::ModelStatusResponse,
            services::scorer::RiskPrediction,
            services::advisor::RiskCategory,
            services::advisor::AlternativeDate,
            services::weather::WeatherObservation,
            services::weather::WeatherOverride,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchrisk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Load the predictive model; a failure is not fatal — scoring falls
    // back to the deterministic formula until an explicit reload succeeds.
    let model = ModelHandle::new(&config.model_path);
    match model.load().await {
        Ok(()) => tracing::info!("Predictive model ready"),
        Err(e) => tracing::warn!(
            "Failed to load model from {}, starting in formula fallback mode: {}",
            config.model_path,
            e
        ),
    }

    let state = AppState {
        pool,
        provider: Arc::new(MockWeatherProvider::new()),
        engine: RiskEngine::new(model),
        lookahead_days: config.alternative_lookahead_days,
    };

    // CORS — the dashboard reads and posts; no headers worth restricting
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/risk/analyze", post(routes::risk::analyze_risk))
        .route("/api/v1/risk/history", get(routes::risk::get_risk_history))
        .route(
            "/api/v1/weather/current/:city",
            get(routes::weather::get_current_weather),
        )
        .route(
            "/api/v1/weather/forecast/:city",
            get(routes::weather::get_forecast),
        )
        .route("/api/v1/model/status", get(routes::model::get_model_status))
        .route("/api/v1/model/reload", post(routes::model::reload_model))
        .route(
            "/api/v1/analytics/metrics",
            get(routes::analytics::get_metrics),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
