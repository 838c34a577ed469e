//! HTTP handlers for scheduled run triggers

use axum::{extract::State, Json};

use crate::services::orchestrator::RunReport;
use crate::AppState;

/// Execute one scheduler tick and report the outcome
///
/// The external scheduler serializes calls; phase failures are carried
/// inside the report, so this endpoint never errors.
pub async fn trigger_run(State(state): State<AppState>) -> Json<RunReport> {
    let report = state.orchestrator.run_once().await;
    Json(report)
}
