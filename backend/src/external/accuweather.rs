//! AccuWeather adapter
//!
//! The only two-step vendor: a geoposition search resolves the coordinates
//! to a location key, then current conditions are fetched for that key with
//! `details=true`. Metric values sit under `*.Metric.Value` and the icon is
//! a number mapped onto the vendor's static icon URL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use shared::{GpsCoordinates, ProviderId, WeatherSnapshot};

use super::provider::{
    classify_request_error, classify_status, ProviderError, ProviderResult, WeatherProvider,
};

const DEFAULT_BASE_URL: &str = "http://dataservice.accuweather.com";

/// AccuWeather API client
#[derive(Clone)]
pub struct AccuWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Geoposition search response, reduced to the location key
#[derive(Debug, Deserialize)]
struct AWLocation {
    #[serde(rename = "Key")]
    key: String,
}

/// One element of the current conditions array
#[derive(Debug, Deserialize)]
struct AWConditions {
    #[serde(rename = "EpochTime")]
    epoch_time: Option<i64>,
    #[serde(rename = "WeatherText", default)]
    weather_text: String,
    #[serde(rename = "WeatherIcon")]
    weather_icon: Option<i32>,
    #[serde(rename = "Temperature")]
    temperature: AWMetricPair,
    #[serde(rename = "RelativeHumidity")]
    relative_humidity: Option<i32>,
    #[serde(rename = "Wind")]
    wind: AWWind,
    #[serde(rename = "UVIndex")]
    uv_index: Option<i32>,
    #[serde(rename = "Pressure")]
    pressure: AWMetricPair,
    #[serde(rename = "Visibility")]
    visibility: AWMetricPair,
    #[serde(rename = "Precip1hr")]
    precip_1hr: Option<AWMetricPair>,
}

#[derive(Debug, Deserialize)]
struct AWMetricPair {
    #[serde(rename = "Metric")]
    metric: AWMetric,
}

#[derive(Debug, Deserialize)]
struct AWMetric {
    #[serde(rename = "Value")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct AWWind {
    #[serde(rename = "Speed")]
    speed: AWMetricPair,
    #[serde(rename = "Direction")]
    direction: Option<AWDirection>,
}

#[derive(Debug, Deserialize)]
struct AWDirection {
    #[serde(rename = "Degrees")]
    degrees: i32,
}

impl AccuWeatherClient {
    /// Create a new AccuWeather client
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

    /// Resolve coordinates to the vendor's location key
    async fn resolve_location_key(&self, coordinates: &GpsCoordinates) -> ProviderResult<String> {
        let url = format!(
            "{}/locations/v1/cities/geoposition/search?apikey={}&q={},{}",
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

        let location: AWLocation = response.json().await.map_err(|e| {
            ProviderError::schema(self.id(), format!("Failed to parse location response: {}", e))
        })?;

        Ok(location.key)
    }

    /// Convert an AccuWeather observation to the normalized snapshot
    fn normalize(&self, data: AWConditions) -> WeatherSnapshot {
        let observed_at = data
            .epoch_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);
        let icon = data
            .weather_icon
            .map(|n| {
                format!(
                    "https://developer.accuweather.com/sites/default/files/{:02}-s.png",
                    n
                )
            })
            .unwrap_or_default();
        // Reported with details=true; a missing block still means "no rain"
        let precipitation_mm = data
            .precip_1hr
            .map(|p| Decimal::from_f64_retain(p.metric.value).unwrap_or_default())
            .unwrap_or_default();

        WeatherSnapshot {
            source: ProviderId::AccuWeather,
            observed_at,
            temperature_celsius: Decimal::from_f64_retain(data.temperature.metric.value)
                .unwrap_or_default(),
            humidity_percent: data.relative_humidity.unwrap_or(0),
            wind_speed_kmh: Some(
                Decimal::from_f64_retain(data.wind.speed.metric.value).unwrap_or_default(),
            ),
            wind_direction_deg: data.wind.direction.map(|d| d.degrees).unwrap_or(0),
            pressure_hpa: data.pressure.metric.value.round() as i32,
            uv_index: data.uv_index.unwrap_or(0),
            visibility_km: Decimal::from_f64_retain(data.visibility.metric.value)
                .unwrap_or_default(),
            precipitation_mm: Some(precipitation_mm),
            condition: data.weather_text,
            icon,
        }
    }
}

#[async_trait]
impl WeatherProvider for AccuWeatherClient {
    fn id(&self) -> ProviderId {
        ProviderId::AccuWeather
    }

    async fn fetch_current(&self, coordinates: &GpsCoordinates) -> ProviderResult<WeatherSnapshot> {
        let location_key = self.resolve_location_key(coordinates).await?;

        let url = format!(
            "{}/currentconditions/v1/{}?apikey={}&language=pt-br&details=true",
            self.base_url, location_key, self.api_key
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

        let conditions: Vec<AWConditions> = response.json().await.map_err(|e| {
            ProviderError::schema(self.id(), format!("Failed to parse response: {}", e))
        })?;

        let current = conditions.into_iter().next().ok_or_else(|| {
            ProviderError::schema(self.id(), "Current conditions array is empty")
        })?;

        Ok(self.normalize(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn client() -> AccuWeatherClient {
        AccuWeatherClient::new("test-key".to_string(), Duration::from_secs(6))
    }

    const CONDITIONS_JSON: &str = r#"[{
        "EpochTime": 1717416000,
        "WeatherText": "Pancadas de chuva",
        "WeatherIcon": 3,
        "Temperature": {"Metric": {"Value": 26.5, "Unit": "C"}},
        "RelativeHumidity": 70,
        "Wind": {
            "Speed": {"Metric": {"Value": 22.5, "Unit": "km/h"}},
            "Direction": {"Degrees": 120}
        },
        "UVIndex": 7,
        "Pressure": {"Metric": {"Value": 1014.0, "Unit": "mb"}},
        "Visibility": {"Metric": {"Value": 9.5, "Unit": "km"}},
        "Precip1hr": {"Metric": {"Value": 2.5, "Unit": "mm"}}
    }]"#;

    #[test]
    fn normalizes_nested_metric_values() {
        let conditions: Vec<AWConditions> = serde_json::from_str(CONDITIONS_JSON).unwrap();
        let snapshot = client().normalize(conditions.into_iter().next().unwrap());

        assert_eq!(snapshot.source, ProviderId::AccuWeather);
        assert_eq!(snapshot.temperature_celsius, dec("26.5"));
        assert_eq!(snapshot.humidity_percent, 70);
        assert_eq!(snapshot.wind_speed_kmh, Some(dec("22.5")));
        assert_eq!(snapshot.wind_direction_deg, 120);
        assert_eq!(snapshot.pressure_hpa, 1014);
        assert_eq!(snapshot.uv_index, 7);
        assert_eq!(snapshot.visibility_km, dec("9.5"));
        assert_eq!(snapshot.precipitation_mm, Some(dec("2.5")));
        assert_eq!(snapshot.condition, "Pancadas de chuva");
    }

    #[test]
    fn icon_number_maps_to_padded_url() {
        let conditions: Vec<AWConditions> = serde_json::from_str(CONDITIONS_JSON).unwrap();
        let snapshot = client().normalize(conditions.into_iter().next().unwrap());
        assert_eq!(
            snapshot.icon,
            "https://developer.accuweather.com/sites/default/files/03-s.png"
        );
    }

    #[test]
    fn missing_precip_block_normalizes_to_zero() {
        let json = r#"[{
            "WeatherText": "Ensolarado",
            "Temperature": {"Metric": {"Value": 30.0, "Unit": "C"}},
            "Wind": {"Speed": {"Metric": {"Value": 10.0, "Unit": "km/h"}}},
            "Pressure": {"Metric": {"Value": 1012.4, "Unit": "mb"}},
            "Visibility": {"Metric": {"Value": 16.0, "Unit": "km"}}
        }]"#;
        let conditions: Vec<AWConditions> = serde_json::from_str(json).unwrap();
        let snapshot = client().normalize(conditions.into_iter().next().unwrap());

        assert_eq!(snapshot.precipitation_mm, Some(Decimal::ZERO));
        assert_eq!(snapshot.humidity_percent, 0);
        assert_eq!(snapshot.wind_direction_deg, 0);
        assert_eq!(snapshot.pressure_hpa, 1012);
        assert_eq!(snapshot.icon, "");
    }

    #[test]
    fn location_response_parses_key() {
        let json = r#"{"Version": 1, "Key": "44944", "Type": "City"}"#;
        let location: AWLocation = serde_json::from_str(json).unwrap();
        assert_eq!(location.key, "44944");
    }
}
