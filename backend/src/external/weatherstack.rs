//! WeatherStack adapter
//!
//! Already metric with `units=m`, so values pass through unconverted. The
//! vendor's quirk is reporting failures as HTTP 200 with an embedded `error`
//! object, which this adapter inspects before trusting the body.

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

const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com";

/// WeatherStack API client
#[derive(Clone)]
pub struct WeatherStackClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// WeatherStack response; exactly one of `current` and `error` is populated
#[derive(Debug, Deserialize)]
struct WSResponse {
    current: Option<WSCurrent>,
    error: Option<WSError>,
}

#[derive(Debug, Deserialize)]
struct WSCurrent {
    temperature: f64,
    humidity: i32,
    wind_speed: f64,
    wind_degree: i32,
    pressure: i32,
    #[serde(default)]
    uv_index: i32,
    visibility: f64,
    precip: f64,
    #[serde(default)]
    weather_descriptions: Vec<String>,
    #[serde(default)]
    weather_icons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WSError {
    code: i32,
    #[serde(default)]
    info: String,
}

impl WeatherStackClient {
    /// Create a new WeatherStack client
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: String, timeout: Duration, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Map a vendor error object to the provider error taxonomy
    ///
    /// 101/102/105 are access-key problems, 104 is the monthly usage cap.
    fn classify_vendor_error(&self, error: WSError) -> ProviderError {
        let detail = format!("WeatherStack error {}: {}", error.code, error.info);
        match error.code {
            101 | 102 | 105 => ProviderError::auth(self.id(), detail),
            104 => ProviderError::rate_limit(self.id(), detail),
            _ => ProviderError::unknown(self.id(), detail),
        }
    }

    /// Convert a WeatherStack observation to the normalized snapshot
    fn normalize(&self, current: WSCurrent) -> WeatherSnapshot {
        WeatherSnapshot {
            source: ProviderId::WeatherStack,
            observed_at: Utc::now(),
            temperature_celsius: Decimal::from_f64_retain(current.temperature)
                .unwrap_or_default(),
            humidity_percent: current.humidity,
            wind_speed_kmh: Some(Decimal::from_f64_retain(current.wind_speed).unwrap_or_default()),
            wind_direction_deg: current.wind_degree,
            pressure_hpa: current.pressure,
            uv_index: current.uv_index,
            visibility_km: Decimal::from_f64_retain(current.visibility).unwrap_or_default(),
            precipitation_mm: Some(Decimal::from_f64_retain(current.precip).unwrap_or_default()),
            condition: current
                .weather_descriptions
                .first()
                .cloned()
                .unwrap_or_default(),
            icon: current.weather_icons.first().cloned().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherStackClient {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherStack
    }

    async fn fetch_current(&self, coordinates: &GpsCoordinates) -> ProviderResult<WeatherSnapshot> {
        let url = format!(
            "{}/current?access_key={}&query={},{}&units=m&language=pt",
            self.base_url, self.api_key, coordinates.latitude, coordinates.longitude
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_request_error(self.id(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(self.id(), status, &body));
        }

        let data: WSResponse = response.json().await.map_err(|e| {
            ProviderError::schema(self.id(), format!("Failed to parse response: {}", e))
        })?;

        if let Some(error) = data.error {
            return Err(self.classify_vendor_error(error));
        }

        let current = data.current.ok_or_else(|| {
            ProviderError::schema(self.id(), "Response carries neither current nor error")
        })?;

        Ok(self.normalize(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::provider::ProviderErrorKind;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn client() -> WeatherStackClient {
        WeatherStackClient::new("test-key".to_string(), Duration::from_secs(6))
    }

    #[test]
    fn normalizes_metric_response_without_conversion() {
        let json = r#"{
            "current": {
                "temperature": 27.5,
                "humidity": 58,
                "wind_speed": 13.0,
                "wind_degree": 140,
                "pressure": 1013,
                "uv_index": 6,
                "visibility": 10.0,
                "precip": 0.5,
                "weather_descriptions": ["Parcialmente nublado"],
                "weather_icons": ["https://cdn.example/icon.png"]
            }
        }"#;
        let data: WSResponse = serde_json::from_str(json).unwrap();
        let snapshot = client().normalize(data.current.unwrap());

        assert_eq!(snapshot.source, ProviderId::WeatherStack);
        assert_eq!(snapshot.temperature_celsius, dec("27.5"));
        assert_eq!(snapshot.wind_speed_kmh, Some(dec("13.0")));
        assert_eq!(snapshot.precipitation_mm, Some(dec("0.5")));
        assert_eq!(snapshot.visibility_km, dec("10.0"));
        assert_eq!(snapshot.uv_index, 6);
        assert_eq!(snapshot.condition, "Parcialmente nublado");
    }

    #[test]
    fn embedded_auth_error_maps_to_auth_kind() {
        let json = r#"{
            "success": false,
            "error": {"code": 101, "type": "invalid_access_key", "info": "invalid key"}
        }"#;
        let data: WSResponse = serde_json::from_str(json).unwrap();
        let err = client().classify_vendor_error(data.error.unwrap());
        assert_eq!(err.kind, ProviderErrorKind::Auth);
        assert_eq!(err.provider, ProviderId::WeatherStack);
    }

    #[test]
    fn embedded_usage_limit_error_maps_to_rate_limit() {
        let json = r#"{"error": {"code": 104, "info": "usage limit reached"}}"#;
        let data: WSResponse = serde_json::from_str(json).unwrap();
        let err = client().classify_vendor_error(data.error.unwrap());
        assert_eq!(err.kind, ProviderErrorKind::RateLimit);
    }

    #[test]
    fn empty_body_is_a_schema_error_shape() {
        let data: WSResponse = serde_json::from_str("{}").unwrap();
        assert!(data.current.is_none());
        assert!(data.error.is_none());
    }
}
