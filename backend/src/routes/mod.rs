//! Route definitions for the weather alerting platform

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Scheduler trigger: one full promo + alert run
        .route("/runs", post(handlers::trigger_run))
        // Current conditions through the provider fallback chain
        .route("/weather", get(handlers::get_current_weather))
        // Monitored locations
        .route("/locations", get(handlers::list_locations))
        // Dispatch audit trail
        .route("/logs", get(handlers::list_dispatch_logs))
        // Alert rule switch
        .route(
            "/alerts/:alert_id/enabled",
            patch(handlers::set_alert_enabled),
        )
}
