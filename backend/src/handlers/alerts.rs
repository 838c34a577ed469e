//! HTTP handlers for alert rule management

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::AlertRule;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Request body for switching a rule on or off
#[derive(Debug, Deserialize)]
pub struct SetEnabledInput {
    pub enabled: bool,
}

/// Enable or disable an alert rule
pub async fn set_alert_enabled(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(input): Json<SetEnabledInput>,
) -> AppResult<Json<AlertRule>> {
    let rule = state
        .store
        .set_alert_rule_enabled(alert_id, input.enabled)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert rule".to_string()))?;
    Ok(Json(rule))
}
