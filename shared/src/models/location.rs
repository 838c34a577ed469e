//! Location models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// A monitored city. Immutable to the alerting core; rules and users refer
/// to it by id, weather lookups use its coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    /// State/region code, e.g. "PE".
    pub region: String,
    pub coordinates: GpsCoordinates,
    pub created_at: DateTime<Utc>,
}
