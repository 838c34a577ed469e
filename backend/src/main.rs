//! SMI Weather Alert Platform - Backend Server
//!
//! Watches the weather over monitored cities through a chain of redundant
//! providers and sends WhatsApp alerts when user-configured thresholds are
//! crossed.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;
mod storage;

pub use config::Config;

use crate::external::{build_providers, TwilioWhatsAppClient};
use crate::services::{
    AlertEvaluator, NotificationDispatcher, RunOrchestrator, WeatherAggregator,
};
use crate::storage::{PgStore, Store};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub aggregator: Arc<WeatherAggregator>,
    pub orchestrator: Arc<RunOrchestrator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smi_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tracing::info!("Starting SMI Weather Alert Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Wire the service graph
    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));

    let providers = build_providers(&config).map_err(|e| anyhow::anyhow!(e))?;
    let aggregator = Arc::new(WeatherAggregator::new(providers, config.provider_timeout()));

    let gateway = Arc::new(TwilioWhatsAppClient::new(
        config.twilio.account_sid.clone(),
        config.twilio.auth_token.clone(),
        config.twilio.from_number.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(gateway, config.twilio.simulate));

    let evaluator = Arc::new(AlertEvaluator::new(
        store.clone(),
        aggregator.clone(),
        dispatcher,
        config.scheduling.refire_cooldown_minutes,
        config.scheduling.fetch_concurrency,
    ));
    let orchestrator = Arc::new(RunOrchestrator::new(
        evaluator,
        config.scheduling.promo_hour,
        config.scheduling.utc_offset_hours,
    ));

    // Create application state
    let state = AppState {
        store,
        aggregator,
        orchestrator,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(liveness))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "SMI Weather Alert Platform API v1.0"
}

/// Liveness endpoint; store-aware health lives under /api/v1/health
async fn liveness() -> &'static str {
    "OK"
}
