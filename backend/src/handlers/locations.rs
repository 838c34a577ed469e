//! HTTP handlers for monitored locations

use axum::{extract::State, Json};

use shared::Location;

use crate::error::AppResult;
use crate::AppState;

/// List every monitored location
pub async fn list_locations(State(state): State<AppState>) -> AppResult<Json<Vec<Location>>> {
    let locations = state.store.locations().await?;
    Ok(Json(locations))
}
