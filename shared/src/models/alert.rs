//! Alert rule models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The weather metric an alert rule watches.
///
/// The threshold unit is implied by the kind: mm/h for rain, km/h for wind,
/// °C for temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Rain,
    Wind,
    Temperature,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Rain => "rain",
            AlertKind::Wind => "wind",
            AlertKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = UnknownAlertKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rain" => Ok(AlertKind::Rain),
            "wind" => Ok(AlertKind::Wind),
            "temperature" => Ok(AlertKind::Temperature),
            _ => Err(UnknownAlertKind(s.to_string())),
        }
    }
}

/// Error for alert kind names that do not match any known metric.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown alert kind: {0}")]
pub struct UnknownAlertKind(pub String);

/// Time-of-day window during which a rule may fire, hours in `[0, 23]`,
/// both ends inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl AlertWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether `hour` falls inside the window.
    ///
    /// The comparison is the literal `start <= hour <= end`. A window with
    /// `end_hour < start_hour` therefore never contains any hour; overnight
    /// windows are not expressible until the product decides they should be.
    pub fn contains(&self, hour: u32) -> bool {
        !(hour < self.start_hour || hour > self.end_hour)
    }
}

/// A per-user threshold alert on one weather metric at one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub kind: AlertKind,
    /// Trigger threshold; the observed value firing the rule satisfies
    /// `value >= threshold`.
    pub threshold: Decimal,
    pub window: AlertWindow,
    pub enabled: bool,
    /// When the rule last produced a dispatch; drives the re-fire cooldown.
    pub last_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
