//! Dispatch log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What a dispatched message was about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Alert,
    Promo,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Alert => "alert",
            MessageKind::Promo => "promo",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(MessageKind::Alert),
            "promo" => Ok(MessageKind::Promo),
            _ => Err(UnknownMessageKind(s.to_string())),
        }
    }
}

/// Error for message kind names outside the known set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown message kind: {0}")]
pub struct UnknownMessageKind(pub String);

/// Append-only record of one outbound dispatch attempt.
///
/// Written exactly once per attempt, whether or not the gateway accepted
/// the message; `delivered` records the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Set for alert dispatches, `None` for promotional broadcasts.
    pub alert_rule_id: Option<Uuid>,
    pub kind: MessageKind,
    pub body: String,
    pub delivered: bool,
    pub sent_at: DateTime<Utc>,
}
