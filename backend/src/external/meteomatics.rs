//! Meteomatics adapter
//!
//! Authenticated with HTTP basic auth instead of an API key, and queried for
//! a single parameter (`t_2m:C`), so every field except temperature carries
//! its documented sentinel. Rain and wind stay `None` on purpose: rules on
//! those metrics must skip rather than read "not reported" as zero.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use shared::{GpsCoordinates, ProviderId, WeatherSnapshot};

use super::provider::{
    classify_request_error, classify_status, ProviderError, ProviderResult, WeatherProvider,
};

/// Meteomatics API client
#[derive(Clone)]
pub struct MeteomaticsClient {
    client: Client,
    username: String,
    password: String,
    base_url: String,
}

/// Meteomatics JSON response, reduced to the parameter/coordinate/date grid
#[derive(Debug, Deserialize)]
struct MMResponse {
    data: Vec<MMParameter>,
}

#[derive(Debug, Deserialize)]
struct MMParameter {
    coordinates: Vec<MMCoordinate>,
}

#[derive(Debug, Deserialize)]
struct MMCoordinate {
    dates: Vec<MMDate>,
}

#[derive(Debug, Deserialize)]
struct MMDate {
    value: f64,
}

impl MeteomaticsClient {
    /// Create a new Meteomatics client
    pub fn new(username: String, password: String, timeout: Duration, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            username,
            password,
            base_url,
        }
    }

    /// Extract the single temperature value from the response grid
    fn extract_temperature(&self, data: &MMResponse) -> ProviderResult<Decimal> {
        data.data
            .first()
            .and_then(|parameter| parameter.coordinates.first())
            .and_then(|coordinate| coordinate.dates.first())
            .map(|date| Decimal::from_f64_retain(date.value).unwrap_or_default())
            .ok_or_else(|| {
                ProviderError::schema(self.id(), "Response grid carries no temperature value")
            })
    }

    /// Fill a snapshot around the one metric this endpoint reports
    fn normalize(&self, temperature_celsius: Decimal) -> WeatherSnapshot {
        WeatherSnapshot {
            source: ProviderId::Meteomatics,
            observed_at: Utc::now(),
            temperature_celsius,
            humidity_percent: 0,
            wind_speed_kmh: None,
            wind_direction_deg: 0,
            pressure_hpa: 0,
            uv_index: 0,
            visibility_km: Decimal::ZERO,
            precipitation_mm: None,
            condition: "Desconhecido".to_string(),
            icon: String::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for MeteomaticsClient {
    fn id(&self) -> ProviderId {
        ProviderId::Meteomatics
    }

    async fn fetch_current(&self, coordinates: &GpsCoordinates) -> ProviderResult<WeatherSnapshot> {
        let instant = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let url = format!(
            "{}/{}/t_2m:C/{},{}/json",
            self.base_url, instant, coordinates.latitude, coordinates.longitude
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| classify_request_error(self.id(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(self.id(), status, &body));
        }

        let data: MMResponse = response.json().await.map_err(|e| {
            ProviderError::schema(self.id(), format!("Failed to parse response: {}", e))
        })?;

        let temperature = self.extract_temperature(&data)?;
        Ok(self.normalize(temperature))
    }
}
