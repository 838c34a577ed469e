//! OpenWeatherMap adapter
//!
//! Default primary vendor. Reports wind in m/s and visibility in meters,
//! both normalized here; rain arrives under `rain.1h` and is omitted
//! entirely in dry weather, which normalizes to zero.

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

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeatherMap API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap current weather response
#[derive(Debug, Deserialize)]
struct OWMResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    visibility: Option<i32>,
    wind: OWMWind,
    rain: Option<OWMRain>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    pressure: i32,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
    deg: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OpenWeatherClient {
    /// Create a new OpenWeatherMap client
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

    /// Convert an OpenWeatherMap response to the normalized snapshot
    fn normalize(&self, data: OWMResponse) -> WeatherSnapshot {
        let weather = data.weather.first();

        // m/s to km/h
        let wind_speed_kmh =
            Decimal::from_f64_retain(data.wind.speed).unwrap_or_default() * Decimal::new(36, 1);
        // meters to km
        let visibility_km = data
            .visibility
            .map(|m| Decimal::from(m) / Decimal::from(1000))
            .unwrap_or_default();
        // Omitted rain block means no rain right now
        let precipitation_mm = data
            .rain
            .as_ref()
            .and_then(|r| r.one_hour)
            .map(|v| Decimal::from_f64_retain(v).unwrap_or_default())
            .unwrap_or_default();

        WeatherSnapshot {
            source: ProviderId::OpenWeatherMap,
            observed_at: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
            temperature_celsius: Decimal::from_f64_retain(data.main.temp).unwrap_or_default(),
            humidity_percent: data.main.humidity,
            wind_speed_kmh: Some(wind_speed_kmh),
            wind_direction_deg: data.wind.deg.unwrap_or(0),
            pressure_hpa: data.main.pressure,
            uv_index: 0,
            visibility_km,
            precipitation_mm: Some(precipitation_mm),
            condition: weather.map(|w| w.description.clone()).unwrap_or_default(),
            icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherMap
    }

    async fn fetch_current(&self, coordinates: &GpsCoordinates) -> ProviderResult<WeatherSnapshot> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric&lang=pt_br",
            self.base_url, coordinates.latitude, coordinates.longitude, self.api_key
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

        let data: OWMResponse = response.json().await.map_err(|e| {
            ProviderError::schema(self.id(), format!("Failed to parse response: {}", e))
        })?;

        Ok(self.normalize(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn client() -> OpenWeatherClient {
        OpenWeatherClient::new("test-key".to_string(), Duration::from_secs(6))
    }

    #[test]
    fn normalizes_units_from_vendor_response() {
        let json = r#"{
            "weather": [{"description": "chuva leve", "icon": "10d"}],
            "main": {"temp": 24.5, "pressure": 1013, "humidity": 78},
            "visibility": 8000,
            "wind": {"speed": 5.0, "deg": 140},
            "rain": {"1h": 1.5},
            "dt": 1717416000
        }"#;
        let data: OWMResponse = serde_json::from_str(json).unwrap();
        let snapshot = client().normalize(data);

        assert_eq!(snapshot.source, ProviderId::OpenWeatherMap);
        assert_eq!(snapshot.temperature_celsius, dec("24.5"));
        assert_eq!(snapshot.humidity_percent, 78);
        // 5 m/s = 18 km/h
        assert_eq!(snapshot.wind_speed_kmh, Some(dec("18.0")));
        assert_eq!(snapshot.wind_direction_deg, 140);
        // 8000 m = 8 km
        assert_eq!(snapshot.visibility_km, dec("8"));
        assert_eq!(snapshot.precipitation_mm, Some(dec("1.5")));
        assert_eq!(snapshot.condition, "chuva leve");
        assert_eq!(snapshot.icon, "10d");
        assert_eq!(snapshot.uv_index, 0);
    }

    #[test]
    fn missing_rain_block_normalizes_to_zero() {
        let json = r#"{
            "weather": [{"description": "céu limpo", "icon": "01d"}],
            "main": {"temp": 31.0, "pressure": 1011, "humidity": 40},
            "visibility": 10000,
            "wind": {"speed": 2.5, "deg": 90},
            "dt": 1717416000
        }"#;
        let data: OWMResponse = serde_json::from_str(json).unwrap();
        let snapshot = client().normalize(data);

        assert_eq!(snapshot.precipitation_mm, Some(Decimal::ZERO));
        assert_eq!(snapshot.wind_speed_kmh, Some(dec("9.0")));
    }

    #[test]
    fn response_without_temperature_fails_to_parse() {
        let json = r#"{
            "weather": [],
            "main": {"pressure": 1011, "humidity": 40},
            "wind": {"speed": 2.5},
            "dt": 1717416000
        }"#;
        assert!(serde_json::from_str::<OWMResponse>(json).is_err());
    }
}
