//! HTTP handlers for the dispatch audit trail

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{DispatchLogEntry, MessageKind};

use crate::error::{AppError, AppResult};
use crate::storage::DispatchLogFilter;
use crate::AppState;

/// Query parameters for the dispatch log read
#[derive(Debug, Deserialize)]
pub struct DispatchLogQuery {
    pub user_id: Option<Uuid>,
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

/// List recent dispatch log entries, newest first
pub async fn list_dispatch_logs(
    State(state): State<AppState>,
    Query(query): Query<DispatchLogQuery>,
) -> AppResult<Json<Vec<DispatchLogEntry>>> {
    let kind = query
        .kind
        .as_deref()
        .map(|name| name.parse::<MessageKind>())
        .transpose()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let filter = DispatchLogFilter {
        user_id: query.user_id,
        kind,
        limit: query.limit.unwrap_or(50).clamp(1, 500),
    };

    let entries = state.store.recent_dispatch_logs(filter).await?;
    Ok(Json(entries))
}
