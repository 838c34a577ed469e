//! Configuration management for the SMI Weather Alert Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SMI_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use shared::ProviderId;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Weather provider configuration
    pub providers: ProvidersConfig,

    /// Twilio WhatsApp gateway configuration
    pub twilio: TwilioConfig,

    /// Scheduled run configuration
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Configuration for the weather acquisition layer
#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// Fallback order; only providers with credentials configured here are
    /// constructed at startup
    pub order: Vec<String>,

    /// Per-provider request timeout in seconds (recommended 5-8)
    pub timeout_secs: u64,

    /// OpenWeatherMap
    pub openweathermap: Option<ApiKeyProviderConfig>,

    /// WeatherStack
    pub weatherstack: Option<ApiKeyProviderConfig>,

    /// AccuWeather
    pub accuweather: Option<ApiKeyProviderConfig>,

    /// Meteomatics (HTTP basic auth instead of an API key)
    pub meteomatics: Option<MeteomaticsConfig>,
}

/// A provider authenticated by a query-string API key
#[derive(Debug, Deserialize, Clone)]
pub struct ApiKeyProviderConfig {
    pub api_key: String,

    /// Override of the vendor endpoint, mainly for tests
    pub base_url: Option<String>,
}

/// Meteomatics credentials
#[derive(Debug, Deserialize, Clone)]
pub struct MeteomaticsConfig {
    pub username: String,
    pub password: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwilioConfig {
    /// Twilio account SID
    pub account_sid: String,

    /// Twilio auth token
    pub auth_token: String,

    /// Sender number, with or without the whatsapp: prefix
    pub from_number: String,

    /// When true, dispatches are logged and reported successful without
    /// calling the gateway
    pub simulate: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulingConfig {
    /// Local civil hour at which the daily promotional broadcast runs
    pub promo_hour: u32,

    /// Offset from UTC used to derive the local hour, e.g. -3 for Recife
    pub utc_offset_hours: i32,

    /// Minutes an alert rule stays quiet after firing
    pub refire_cooldown_minutes: i64,

    /// How many locations are fetched from providers concurrently
    pub fetch_concurrency: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("SMI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default(
                "providers.order",
                vec![
                    "openweathermap".to_string(),
                    "weatherstack".to_string(),
                    "accuweather".to_string(),
                    "meteomatics".to_string(),
                ],
            )?
            .set_default("providers.timeout_secs", 6)?
            .set_default("twilio.account_sid", "")?
            .set_default("twilio.auth_token", "")?
            .set_default("twilio.from_number", "")?
            .set_default("twilio.simulate", environment != "production")?
            .set_default("scheduling.promo_hour", 7)?
            .set_default("scheduling.utc_offset_hours", -3)?
            .set_default("scheduling.refire_cooldown_minutes", 60)?
            .set_default("scheduling.fetch_concurrency", 4)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SMI_ prefix)
            .add_source(
                Environment::with_prefix("SMI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject configurations the alerting core cannot run on.
    ///
    /// Called once at startup so misconfiguration fails loudly instead of
    /// surfacing as skipped rules at the first scheduled run.
    pub fn validate(&self) -> Result<(), String> {
        let order = self.provider_order()?;
        if order.is_empty() {
            return Err("providers.order is empty".to_string());
        }
        if !order.iter().any(|id| self.has_credentials(*id)) {
            return Err("no weather provider has credentials configured".to_string());
        }
        if self.providers.timeout_secs == 0 {
            return Err("providers.timeout_secs must be positive".to_string());
        }
        if self.scheduling.promo_hour > 23 {
            return Err("scheduling.promo_hour must be between 0 and 23".to_string());
        }
        if self.scheduling.utc_offset_hours < -12 || self.scheduling.utc_offset_hours > 14 {
            return Err("scheduling.utc_offset_hours must be between -12 and 14".to_string());
        }
        if self.scheduling.fetch_concurrency == 0 {
            return Err("scheduling.fetch_concurrency must be positive".to_string());
        }
        if !self.twilio.simulate
            && (self.twilio.account_sid.is_empty()
                || self.twilio.auth_token.is_empty()
                || self.twilio.from_number.is_empty())
        {
            return Err("twilio credentials are required unless twilio.simulate is set".to_string());
        }
        Ok(())
    }

    /// The configured fallback order as typed provider ids.
    pub fn provider_order(&self) -> Result<Vec<ProviderId>, String> {
        self.providers
            .order
            .iter()
            .map(|name| ProviderId::from_str(name).map_err(|e| e.to_string()))
            .collect()
    }

    /// Whether credentials exist for a provider.
    pub fn has_credentials(&self, id: ProviderId) -> bool {
        match id {
            ProviderId::OpenWeatherMap => self.providers.openweathermap.is_some(),
            ProviderId::WeatherStack => self.providers.weatherstack.is_some(),
            ProviderId::AccuWeather => self.providers.accuweather.is_some(),
            ProviderId::Meteomatics => self.providers.meteomatics.is_some(),
        }
    }

    /// Per-provider request timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
