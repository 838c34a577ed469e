//! External API integrations

pub mod accuweather;
pub mod meteomatics;
pub mod openweather;
pub mod provider;
pub mod weatherstack;
pub mod whatsapp;

pub use accuweather::AccuWeatherClient;
pub use meteomatics::MeteomaticsClient;
pub use openweather::OpenWeatherClient;
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult, WeatherProvider};
pub use weatherstack::WeatherStackClient;
pub use whatsapp::{MessageGateway, TwilioWhatsAppClient};

use std::sync::Arc;

use shared::ProviderId;

use crate::config::Config;

const METEOMATICS_DEFAULT_BASE_URL: &str = "https://api.meteomatics.com";

/// Construct the configured provider chain, in fallback order.
///
/// Providers listed in `providers.order` without credentials are skipped with
/// a warning; an empty chain is an error because the platform cannot run
/// without at least one weather source.
pub fn build_providers(config: &Config) -> Result<Vec<Arc<dyn WeatherProvider>>, String> {
    let timeout = config.provider_timeout();
    let mut providers: Vec<Arc<dyn WeatherProvider>> = Vec::new();

    for id in config.provider_order()? {
        match id {
            ProviderId::OpenWeatherMap => match &config.providers.openweathermap {
                Some(p) => {
                    let client = match &p.base_url {
                        Some(base) => OpenWeatherClient::with_base_url(
                            p.api_key.clone(),
                            timeout,
                            base.clone(),
                        ),
                        None => OpenWeatherClient::new(p.api_key.clone(), timeout),
                    };
                    providers.push(Arc::new(client));
                }
                None => tracing::warn!("Skipping {}: no credentials configured", id),
            },
            ProviderId::WeatherStack => match &config.providers.weatherstack {
                Some(p) => {
                    let client = match &p.base_url {
                        Some(base) => WeatherStackClient::with_base_url(
                            p.api_key.clone(),
                            timeout,
                            base.clone(),
                        ),
                        None => WeatherStackClient::new(p.api_key.clone(), timeout),
                    };
                    providers.push(Arc::new(client));
                }
                None => tracing::warn!("Skipping {}: no credentials configured", id),
            },
            ProviderId::AccuWeather => match &config.providers.accuweather {
                Some(p) => {
                    let client = match &p.base_url {
                        Some(base) => AccuWeatherClient::with_base_url(
                            p.api_key.clone(),
                            timeout,
                            base.clone(),
                        ),
                        None => AccuWeatherClient::new(p.api_key.clone(), timeout),
                    };
                    providers.push(Arc::new(client));
                }
                None => tracing::warn!("Skipping {}: no credentials configured", id),
            },
            ProviderId::Meteomatics => match &config.providers.meteomatics {
                Some(p) => {
                    let base = p
                        .base_url
                        .clone()
                        .unwrap_or_else(|| METEOMATICS_DEFAULT_BASE_URL.to_string());
                    providers.push(Arc::new(MeteomaticsClient::new(
                        p.username.clone(),
                        p.password.clone(),
                        timeout,
                        base,
                    )));
                }
                None => tracing::warn!("Skipping {}: no credentials configured", id),
            },
        }
    }

    if providers.is_empty() {
        return Err("no weather provider has credentials configured".to_string());
    }
    Ok(providers)
}
