//! Outbound notification dispatch
//!
//! Wraps the WhatsApp gateway behind a boolean send contract: delivery either
//! worked or it did not, and the caller decides what to record. In simulated
//! mode (the default outside production) messages are logged and counted as
//! delivered without touching the gateway.

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::{AlertKind, Location, WeatherSnapshot};

use crate::external::MessageGateway;

/// Gateway-agnostic dispatcher with an infallible send.
#[derive(Clone)]
pub struct NotificationDispatcher {
    gateway: Arc<dyn MessageGateway>,
    simulate: bool,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn MessageGateway>, simulate: bool) -> Self {
        Self { gateway, simulate }
    }

    /// Deliver `body` to `phone` over WhatsApp.
    ///
    /// Returns whether the gateway accepted the message. Gateway failures
    /// are logged and reported as `false`, never raised.
    pub async fn send(&self, phone: &str, body: &str) -> bool {
        if phone.is_empty() {
            tracing::warn!("Dropping dispatch to empty phone number");
            return false;
        }

        if self.simulate {
            tracing::info!("WhatsApp message (simulated) to {}", phone);
            tracing::debug!("Simulated message body:\n{}", body);
            return true;
        }

        match self.gateway.send(phone, body).await {
            Ok(sid) => {
                tracing::info!("WhatsApp message {} accepted for {}", sid, phone);
                true
            }
            Err(err) => {
                tracing::error!("Error sending WhatsApp message to {}: {}", phone, err);
                false
            }
        }
    }
}

/// Body of a threshold alert, in pt-BR with WhatsApp markup.
pub fn alert_message(
    user_name: &str,
    city_name: &str,
    kind: AlertKind,
    value: Decimal,
    threshold: Decimal,
) -> String {
    match kind {
        AlertKind::Rain => format!(
            "🌧️ *ALERTA DE CHUVA* 🌧️\n\nOlá {user_name}!\n\nDetectamos chuva intensa em {city_name}:\n• Precipitação atual: {value}mm/h\n• Seu limite: {threshold}mm/h\n\n⚠️ Tome cuidado ao sair de casa!\n\n_SMI-PE - Sistema Meteorológico Inteligente_"
        ),
        AlertKind::Wind => format!(
            "💨 *ALERTA DE VENTO* 💨\n\nOlá {user_name}!\n\nVentos fortes detectados em {city_name}:\n• Velocidade atual: {value}km/h\n• Seu limite: {threshold}km/h\n\n⚠️ Cuidado com objetos soltos!\n\n_SMI-PE - Sistema Meteorológico Inteligente_"
        ),
        AlertKind::Temperature => format!(
            "🌡️ *ALERTA DE TEMPERATURA* 🌡️\n\nOlá {user_name}!\n\nTemperatura elevada em {city_name}:\n• Temperatura atual: {value}°C\n• Seu limite: {threshold}°C\n\n☀️ Mantenha-se hidratado!\n\n_SMI-PE - Sistema Meteorológico Inteligente_"
        ),
    }
}

/// Body of the daily promotional broadcast, headed by the current conditions
/// at the recipient's home location.
pub fn promo_message(user_name: &str, location: &Location, snapshot: &WeatherSnapshot) -> String {
    let precipitation_line = match snapshot.precipitation_mm {
        Some(mm) => format!("🌧️ Precipitação: {mm}mm/h\n"),
        None => String::new(),
    };

    format!(
        "Bom dia, {user_name}! ☀️\n\n📍 *{} - {}*\n🌡️ Temperatura: {}°C\n☁️ Condição: {}\n{precipitation_line}\n💬 *Patrocínio:*\nExperimente já o novo serviço do SMI-PE com alertas personalizados. Responda com \"QUERO\" e receba as novidades!",
        location.name, location.region, snapshot.temperature_celsius, snapshot.condition
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use shared::{GpsCoordinates, ProviderId};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct FakeGateway {
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeGateway {
        fn new(fail: bool) -> (Arc<dyn MessageGateway>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let gateway = Arc::new(FakeGateway {
                fail,
                calls: calls.clone(),
            });
            (gateway, calls)
        }
    }

    #[async_trait]
    impl MessageGateway for FakeGateway {
        async fn send(&self, _phone: &str, _body: &str) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("gateway down".to_string())
            } else {
                Ok("SM00000000000000000000000000000001".to_string())
            }
        }
    }

    fn garanhuns() -> Location {
        Location {
            id: Uuid::new_v4(),
            name: "Garanhuns".to_string(),
            region: "PE".to_string(),
            coordinates: GpsCoordinates::new(dec("-8.89"), dec("-36.5")),
            created_at: Utc::now(),
        }
    }

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            source: ProviderId::OpenWeatherMap,
            observed_at: Utc::now(),
            temperature_celsius: dec("24.5"),
            humidity_percent: 80,
            wind_speed_kmh: Some(dec("14.0")),
            wind_direction_deg: 120,
            pressure_hpa: 1015,
            uv_index: 6,
            visibility_km: dec("10.0"),
            precipitation_mm: Some(dec("2.5")),
            condition: "nublado".to_string(),
            icon: String::new(),
        }
    }

    #[tokio::test]
    async fn gateway_failure_reports_false_instead_of_erroring() {
        let (gateway, _) = FakeGateway::new(true);
        let dispatcher = NotificationDispatcher::new(gateway, false);
        assert!(!dispatcher.send("+5587999990000", "corpo").await);
    }

    #[tokio::test]
    async fn accepted_message_reports_true() {
        let (gateway, calls) = FakeGateway::new(false);
        let dispatcher = NotificationDispatcher::new(gateway, false);
        assert!(dispatcher.send("+5587999990000", "corpo").await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn simulated_mode_never_reaches_the_gateway() {
        let (gateway, calls) = FakeGateway::new(true);
        let dispatcher = NotificationDispatcher::new(gateway, true);
        assert!(dispatcher.send("+5587999990000", "corpo").await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_phone_is_rejected_without_gateway_call() {
        let (gateway, calls) = FakeGateway::new(false);
        let dispatcher = NotificationDispatcher::new(gateway, false);
        assert!(!dispatcher.send("", "corpo").await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rain_alert_body_carries_value_and_threshold() {
        let body = alert_message("Maria", "Garanhuns", AlertKind::Rain, dec("12.5"), dec("10"));
        assert!(body.contains("ALERTA DE CHUVA"));
        assert!(body.contains("Olá Maria!"));
        assert!(body.contains("Garanhuns"));
        assert!(body.contains("Precipitação atual: 12.5mm/h"));
        assert!(body.contains("Seu limite: 10mm/h"));
        assert!(body.contains("_SMI-PE - Sistema Meteorológico Inteligente_"));
    }

    #[test]
    fn wind_and_temperature_alerts_use_their_units() {
        let wind = alert_message("João", "Recife", AlertKind::Wind, dec("52.5"), dec("40"));
        assert!(wind.contains("ALERTA DE VENTO"));
        assert!(wind.contains("Velocidade atual: 52.5km/h"));

        let temp =
            alert_message("João", "Recife", AlertKind::Temperature, dec("38.5"), dec("35"));
        assert!(temp.contains("ALERTA DE TEMPERATURA"));
        assert!(temp.contains("Temperatura atual: 38.5°C"));
        assert!(temp.contains("Seu limite: 35°C"));
    }

    #[test]
    fn promo_body_summarizes_home_conditions() {
        let body = promo_message("Maria", &garanhuns(), &snapshot());
        assert!(body.contains("Bom dia, Maria! ☀️"));
        assert!(body.contains("*Garanhuns - PE*"));
        assert!(body.contains("Temperatura: 24.5°C"));
        assert!(body.contains("Condição: nublado"));
        assert!(body.contains("Precipitação: 2.5mm/h"));
        assert!(body.contains("QUERO"));
    }

    #[test]
    fn promo_body_omits_unreported_precipitation() {
        let mut current = snapshot();
        current.precipitation_mm = None;
        let body = promo_message("Maria", &garanhuns(), &current);
        assert!(!body.contains("Precipitação"));
    }
}
