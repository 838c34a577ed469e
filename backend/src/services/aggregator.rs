//! Weather aggregation across the provider fallback chain
//!
//! One aggregator fronts every configured vendor adapter. A snapshot request
//! walks the chain in configured order (optionally starting at a preferred
//! source) and returns the first successful fetch; only when every adapter
//! has failed does the caller see an error, carrying one entry per attempt.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use shared::{GpsCoordinates, ProviderId, WeatherSnapshot};

use crate::external::{ProviderError, WeatherProvider};

/// Every provider in the chain was attempted and none produced a snapshot.
#[derive(Debug, Clone, Error)]
#[error("{}", describe_attempts(.attempts))]
pub struct AggregateError {
    /// One error per adapter attempted, in attempt order.
    pub attempts: Vec<ProviderError>,
}

fn describe_attempts(attempts: &[ProviderError]) -> String {
    if attempts.is_empty() {
        return "no weather providers configured".to_string();
    }
    attempts
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Priority-ordered fan-out over the configured weather providers.
#[derive(Clone)]
pub struct WeatherAggregator {
    providers: Vec<Arc<dyn WeatherProvider>>,
    attempt_timeout: Duration,
}

impl WeatherAggregator {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>, attempt_timeout: Duration) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    /// Fetch current conditions at `coordinates`.
    ///
    /// With a `preferred` source the chain is reordered to consult that
    /// adapter first; the rest keep their configured order as fallback.
    /// Each attempt is bounded by the aggregator's timeout regardless of
    /// the adapter's own transport timeout.
    pub async fn get_snapshot(
        &self,
        coordinates: &GpsCoordinates,
        preferred: Option<ProviderId>,
    ) -> Result<WeatherSnapshot, AggregateError> {
        let mut attempts = Vec::new();

        for provider in self.attempt_order(preferred) {
            let id = provider.id();
            match timeout(self.attempt_timeout, provider.fetch_current(coordinates)).await {
                Ok(Ok(snapshot)) => {
                    tracing::debug!(
                        "Weather at {},{} served by {}",
                        coordinates.latitude,
                        coordinates.longitude,
                        id
                    );
                    return Ok(snapshot);
                }
                Ok(Err(err)) => {
                    tracing::warn!("Provider {} failed: {}", id, err);
                    attempts.push(err);
                }
                Err(_) => {
                    let err = ProviderError::timeout(
                        id,
                        format!("no response within {:?}", self.attempt_timeout),
                    );
                    tracing::warn!("Provider {} failed: {}", id, err);
                    attempts.push(err);
                }
            }
        }

        Err(AggregateError { attempts })
    }

    fn attempt_order(&self, preferred: Option<ProviderId>) -> Vec<&Arc<dyn WeatherProvider>> {
        match preferred {
            Some(id) => {
                let mut ordered: Vec<_> =
                    self.providers.iter().filter(|p| p.id() == id).collect();
                ordered.extend(self.providers.iter().filter(|p| p.id() != id));
                ordered
            }
            None => self.providers.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::external::{ProviderErrorKind, ProviderResult};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn recife() -> GpsCoordinates {
        GpsCoordinates::new(dec("-8.05"), dec("-34.9"))
    }

    fn snapshot(source: ProviderId) -> WeatherSnapshot {
        WeatherSnapshot {
            source,
            observed_at: Utc::now(),
            temperature_celsius: dec("27.5"),
            humidity_percent: 70,
            wind_speed_kmh: Some(dec("12.0")),
            wind_direction_deg: 90,
            pressure_hpa: 1013,
            uv_index: 5,
            visibility_km: dec("10.0"),
            precipitation_mm: Some(Decimal::ZERO),
            condition: "céu limpo".to_string(),
            icon: String::new(),
        }
    }

    struct FakeProvider {
        id: ProviderId,
        fail_with: Option<ProviderErrorKind>,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn ok(id: ProviderId) -> (Arc<dyn WeatherProvider>, Arc<AtomicUsize>) {
            Self::build(id, None, None)
        }

        fn failing(
            id: ProviderId,
            kind: ProviderErrorKind,
        ) -> (Arc<dyn WeatherProvider>, Arc<AtomicUsize>) {
            Self::build(id, Some(kind), None)
        }

        fn slow(id: ProviderId, delay: Duration) -> (Arc<dyn WeatherProvider>, Arc<AtomicUsize>) {
            Self::build(id, None, Some(delay))
        }

        fn build(
            id: ProviderId,
            fail_with: Option<ProviderErrorKind>,
            delay: Option<Duration>,
        ) -> (Arc<dyn WeatherProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Arc::new(FakeProvider {
                id,
                fail_with,
                delay,
                calls: calls.clone(),
            });
            (provider, calls)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn fetch_current(
            &self,
            _coordinates: &GpsCoordinates,
        ) -> ProviderResult<WeatherSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_with {
                Some(kind) => Err(ProviderError::new(self.id, kind, "scripted failure")),
                None => Ok(snapshot(self.id)),
            }
        }
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let (first, _) = FakeProvider::failing(ProviderId::OpenWeatherMap, ProviderErrorKind::Auth);
        let (second, _) = FakeProvider::ok(ProviderId::WeatherStack);
        let (third, third_calls) = FakeProvider::ok(ProviderId::AccuWeather);

        let aggregator =
            WeatherAggregator::new(vec![first, second, third], Duration::from_secs(1));
        let snapshot = aggregator.get_snapshot(&recife(), None).await.unwrap();

        assert_eq!(snapshot.source, ProviderId::WeatherStack);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preferred_source_is_consulted_first() {
        let (first, first_calls) = FakeProvider::ok(ProviderId::OpenWeatherMap);
        let (second, _) = FakeProvider::ok(ProviderId::AccuWeather);

        let aggregator = WeatherAggregator::new(vec![first, second], Duration::from_secs(1));
        let snapshot = aggregator
            .get_snapshot(&recife(), Some(ProviderId::AccuWeather))
            .await
            .unwrap();

        assert_eq!(snapshot.source, ProviderId::AccuWeather);
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preferred_source_still_falls_back_on_failure() {
        let (first, _) = FakeProvider::ok(ProviderId::OpenWeatherMap);
        let (second, _) =
            FakeProvider::failing(ProviderId::AccuWeather, ProviderErrorKind::RateLimit);

        let aggregator = WeatherAggregator::new(vec![first, second], Duration::from_secs(1));
        let snapshot = aggregator
            .get_snapshot(&recife(), Some(ProviderId::AccuWeather))
            .await
            .unwrap();

        assert_eq!(snapshot.source, ProviderId::OpenWeatherMap);
    }

    #[tokio::test]
    async fn total_failure_carries_one_error_per_provider() {
        let (first, _) = FakeProvider::failing(ProviderId::OpenWeatherMap, ProviderErrorKind::Auth);
        let (second, _) =
            FakeProvider::failing(ProviderId::WeatherStack, ProviderErrorKind::RateLimit);
        let (third, _) = FakeProvider::failing(ProviderId::Meteomatics, ProviderErrorKind::Schema);

        let aggregator =
            WeatherAggregator::new(vec![first, second, third], Duration::from_secs(1));
        let err = aggregator.get_snapshot(&recife(), None).await.unwrap_err();

        assert_eq!(err.attempts.len(), 3);
        assert_eq!(err.attempts[0].provider, ProviderId::OpenWeatherMap);
        assert_eq!(err.attempts[0].kind, ProviderErrorKind::Auth);
        assert_eq!(err.attempts[1].provider, ProviderId::WeatherStack);
        assert_eq!(err.attempts[1].kind, ProviderErrorKind::RateLimit);
        assert_eq!(err.attempts[2].provider, ProviderId::Meteomatics);
        assert_eq!(err.attempts[2].kind, ProviderErrorKind::Schema);

        let rendered = err.to_string();
        assert!(rendered.contains("openweathermap"));
        assert!(rendered.contains("weatherstack"));
        assert!(rendered.contains("meteomatics"));
    }

    #[tokio::test]
    async fn unresponsive_provider_is_cut_off_as_timeout() {
        let (slow, _) =
            FakeProvider::slow(ProviderId::OpenWeatherMap, Duration::from_millis(250));
        let (backup, _) = FakeProvider::ok(ProviderId::WeatherStack);

        let aggregator = WeatherAggregator::new(vec![slow, backup], Duration::from_millis(20));
        let snapshot = aggregator.get_snapshot(&recife(), None).await.unwrap();
        assert_eq!(snapshot.source, ProviderId::WeatherStack);

        let (slow_again, _) =
            FakeProvider::slow(ProviderId::OpenWeatherMap, Duration::from_millis(250));
        let aggregator = WeatherAggregator::new(vec![slow_again], Duration::from_millis(20));
        let err = aggregator.get_snapshot(&recife(), None).await.unwrap_err();
        assert_eq!(err.attempts.len(), 1);
        assert_eq!(err.attempts[0].kind, ProviderErrorKind::Timeout);
    }

    #[tokio::test]
    async fn empty_chain_reports_no_providers() {
        let aggregator = WeatherAggregator::new(Vec::new(), Duration::from_secs(1));
        let err = aggregator.get_snapshot(&recife(), None).await.unwrap_err();
        assert!(err.attempts.is_empty());
        assert!(err.to_string().contains("no weather providers"));
    }
}
