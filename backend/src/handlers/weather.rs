//! HTTP handlers for current weather reads

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use shared::{validate_latitude, validate_longitude, GpsCoordinates, ProviderId, WeatherSnapshot};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Query parameters for a current-conditions read
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherQuery {
    pub lat: Decimal,
    pub lon: Decimal,
    /// Preferred provider name; the fallback chain still applies behind it.
    pub source: Option<String>,
}

/// Fetch current conditions through the provider fallback chain
pub async fn get_current_weather(
    State(state): State<AppState>,
    Query(query): Query<CurrentWeatherQuery>,
) -> AppResult<Json<WeatherSnapshot>> {
    validate_latitude(query.lat).map_err(|e| AppError::ValidationError(e.to_string()))?;
    validate_longitude(query.lon).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let preferred = query
        .source
        .as_deref()
        .map(|name| name.parse::<ProviderId>())
        .transpose()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let coordinates = GpsCoordinates::new(query.lat, query.lon);
    let snapshot = state.aggregator.get_snapshot(&coordinates, preferred).await?;
    Ok(Json(snapshot))
}
