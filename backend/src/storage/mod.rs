//! Persistence boundary for the alerting core
//!
//! The evaluator and handlers talk to a [`Store`] trait object; the concrete
//! engine behind it stays swappable. [`pg::PgStore`] is the production
//! implementation.

pub mod pg;

#[cfg(test)]
pub mod memory;

pub use pg::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared::{AlertRule, DispatchLogEntry, Location, MessageKind, User};

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row no longer maps onto the domain model, e.g. an enum
    /// column holding an unrecognized value.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Input for appending one dispatch attempt to the log.
///
/// `id` and `sent_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDispatchLog {
    pub user_id: Uuid,
    pub alert_rule_id: Option<Uuid>,
    pub kind: MessageKind,
    pub body: String,
    pub delivered: bool,
}

/// Filter for reading back the dispatch log, newest first.
#[derive(Debug, Clone, Copy)]
pub struct DispatchLogFilter {
    pub user_id: Option<Uuid>,
    pub kind: Option<MessageKind>,
    pub limit: i64,
}

impl Default for DispatchLogFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            kind: None,
            limit: 50,
        }
    }
}

/// Reads and writes the alerting core needs from persistence.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// All enabled alert rules, oldest first.
    async fn active_alert_rules(&self) -> Result<Vec<AlertRule>, StoreError>;

    async fn find_alert_rule(&self, id: Uuid) -> Result<Option<AlertRule>, StoreError>;

    /// Flip a rule's enabled flag, returning the updated rule, or `None`
    /// when no such rule exists.
    async fn set_alert_rule_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<AlertRule>, StoreError>;

    /// Record that a rule fired, starting its re-fire cooldown.
    async fn mark_alert_rule_fired(
        &self,
        id: Uuid,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Users the promotional broadcast may target: opted in, with a phone
    /// number and a home location on file.
    async fn promo_recipients(&self) -> Result<Vec<User>, StoreError>;

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, StoreError>;

    async fn locations(&self) -> Result<Vec<Location>, StoreError>;

    /// Append one dispatch attempt. Called exactly once per attempt,
    /// delivered or not.
    async fn append_dispatch_log(
        &self,
        entry: NewDispatchLog,
    ) -> Result<DispatchLogEntry, StoreError>;

    async fn recent_dispatch_logs(
        &self,
        filter: DispatchLogFilter,
    ) -> Result<Vec<DispatchLogEntry>, StoreError>;
}
