//! Weather provider abstraction
//!
//! Every vendor adapter implements [`WeatherProvider`] and reports failures
//! through the shared [`ProviderError`] taxonomy so the aggregator can treat
//! all vendors uniformly. Adapters never retry; fallback across providers is
//! the aggregator's job.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use shared::{GpsCoordinates, ProviderId, WeatherSnapshot};

/// Result type alias for provider fetches
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Why a provider fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rejected credentials (401/403 or a vendor auth error code)
    Auth,
    /// The request did not complete within the configured timeout
    Timeout,
    /// Vendor quota exhausted (429 or a vendor rate-limit error code)
    RateLimit,
    /// Response did not match the vendor's documented shape
    Schema,
    /// Anything else (connect failures, 5xx, unclassified vendor errors)
    Unknown,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::RateLimit => "rate_limit",
            ProviderErrorKind::Schema => "schema",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

/// A failed fetch from one vendor
#[derive(Debug, Clone, Error)]
#[error("{provider} ({}): {detail}", .kind.as_str())]
pub struct ProviderError {
    pub provider: ProviderId,
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderError {
    pub fn new(provider: ProviderId, kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            detail: detail.into(),
        }
    }

    pub fn auth(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Auth, detail)
    }

    pub fn timeout(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Timeout, detail)
    }

    pub fn rate_limit(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::RateLimit, detail)
    }

    pub fn schema(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Schema, detail)
    }

    pub fn unknown(provider: ProviderId, detail: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Unknown, detail)
    }
}

/// A source of normalized current-weather observations
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Which vendor this adapter talks to
    fn id(&self) -> ProviderId;

    /// Fetch and normalize the current conditions at `coordinates`
    async fn fetch_current(&self, coordinates: &GpsCoordinates) -> ProviderResult<WeatherSnapshot>;
}

/// Classify a transport-level reqwest failure
pub(crate) fn classify_request_error(provider: ProviderId, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(provider, err.to_string())
    } else if err.is_decode() {
        ProviderError::schema(provider, err.to_string())
    } else {
        ProviderError::unknown(provider, err.to_string())
    }
}

/// Classify a non-success HTTP status
pub(crate) fn classify_status(provider: ProviderId, status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::auth(provider, detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limit(provider, detail),
        _ => ProviderError::unknown(provider, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_maps_auth_and_rate_limit() {
        let auth = classify_status(ProviderId::OpenWeatherMap, StatusCode::UNAUTHORIZED, "no key");
        assert_eq!(auth.kind, ProviderErrorKind::Auth);

        let forbidden = classify_status(ProviderId::AccuWeather, StatusCode::FORBIDDEN, "denied");
        assert_eq!(forbidden.kind, ProviderErrorKind::Auth);

        let throttled =
            classify_status(ProviderId::WeatherStack, StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(throttled.kind, ProviderErrorKind::RateLimit);

        let server = classify_status(ProviderId::Meteomatics, StatusCode::BAD_GATEWAY, "oops");
        assert_eq!(server.kind, ProviderErrorKind::Unknown);
    }

    #[test]
    fn error_display_names_provider_and_kind() {
        let err = ProviderError::rate_limit(ProviderId::WeatherStack, "quota exceeded");
        let rendered = err.to_string();
        assert!(rendered.contains("weatherstack"));
        assert!(rendered.contains("rate_limit"));
        assert!(rendered.contains("quota exceeded"));
    }
}
