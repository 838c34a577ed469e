//! Weather data models
//!
//! Every provider response is normalized into [`WeatherSnapshot`] before it
//! leaves the acquisition layer. Units are fixed: °C, %, km/h, degrees, hPa,
//! km and mm. Fields a vendor does not report carry a documented sentinel so
//! downstream code never sees a vendor-specific gap.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which upstream vendor produced a snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenWeatherMap,
    WeatherStack,
    AccuWeather,
    Meteomatics,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeatherMap => "openweathermap",
            ProviderId::WeatherStack => "weatherstack",
            ProviderId::AccuWeather => "accuweather",
            ProviderId::Meteomatics => "meteomatics",
        }
    }

    /// All known providers, in the default fallback order.
    pub fn all() -> [ProviderId; 4] {
        [
            ProviderId::OpenWeatherMap,
            ProviderId::WeatherStack,
            ProviderId::AccuWeather,
            ProviderId::Meteomatics,
        ]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openweathermap" => Ok(ProviderId::OpenWeatherMap),
            "weatherstack" => Ok(ProviderId::WeatherStack),
            "accuweather" => Ok(ProviderId::AccuWeather),
            "meteomatics" => Ok(ProviderId::Meteomatics),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Error for provider names that do not match any known vendor.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown weather provider: {0}")]
pub struct UnknownProvider(pub String);

/// A normalized weather observation for one location at one point in time.
///
/// `temperature_celsius` is always present; a provider response without a
/// usable temperature is a schema error, not a snapshot. `wind_speed_kmh`
/// and `precipitation_mm` feed alert rules, so "not reported" must stay
/// distinguishable from zero and both are `Option`. The remaining optional
/// vendor fields use in-band sentinels: `0` for the integer gauges and
/// `visibility_km`, an empty string for `icon`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Which vendor this observation came from.
    pub source: ProviderId,
    pub observed_at: DateTime<Utc>,
    pub temperature_celsius: Decimal,
    pub humidity_percent: i32,
    pub wind_speed_kmh: Option<Decimal>,
    pub wind_direction_deg: i32,
    pub pressure_hpa: i32,
    pub uv_index: i32,
    pub visibility_km: Decimal,
    pub precipitation_mm: Option<Decimal>,
    /// Human-readable condition text, localized when the vendor supports it.
    pub condition: String,
    pub icon: String,
}
