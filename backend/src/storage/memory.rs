//! In-memory [`Store`] backing the service tests

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::{AlertRule, DispatchLogEntry, Location, User};

use super::{DispatchLogFilter, NewDispatchLog, Store, StoreError};

/// Store over hash maps, mirroring the ordering semantics of [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    alert_rules: HashMap<Uuid, AlertRule>,
    users: HashMap<Uuid, User>,
    locations: HashMap<Uuid, Location>,
    dispatch_log: Vec<DispatchLogEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_alert_rule(&self, rule: AlertRule) {
        self.inner.write().await.alert_rules.insert(rule.id, rule);
    }

    pub async fn insert_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    pub async fn insert_location(&self, location: Location) {
        self.inner.write().await.locations.insert(location.id, location);
    }

    /// Full dispatch log in insertion order, for assertions.
    pub async fn dispatch_log(&self) -> Vec<DispatchLogEntry> {
        self.inner.read().await.dispatch_log.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn active_alert_rules(&self) -> Result<Vec<AlertRule>, StoreError> {
        let inner = self.inner.read().await;
        let mut rules: Vec<AlertRule> = inner
            .alert_rules
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.created_at);
        Ok(rules)
    }

    async fn find_alert_rule(&self, id: Uuid) -> Result<Option<AlertRule>, StoreError> {
        Ok(self.inner.read().await.alert_rules.get(&id).cloned())
    }

    async fn set_alert_rule_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<AlertRule>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.alert_rules.get_mut(&id).map(|rule| {
            rule.enabled = enabled;
            rule.clone()
        }))
    }

    async fn mark_alert_rule_fired(
        &self,
        id: Uuid,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(rule) = inner.alert_rules.get_mut(&id) {
            rule.last_fired_at = Some(fired_at);
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn promo_recipients(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.promo_eligible())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, StoreError> {
        Ok(self.inner.read().await.locations.get(&id).cloned())
    }

    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        let inner = self.inner.read().await;
        let mut locations: Vec<Location> = inner.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn append_dispatch_log(
        &self,
        entry: NewDispatchLog,
    ) -> Result<DispatchLogEntry, StoreError> {
        let record = DispatchLogEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            alert_rule_id: entry.alert_rule_id,
            kind: entry.kind,
            body: entry.body,
            delivered: entry.delivered,
            sent_at: Utc::now(),
        };
        self.inner.write().await.dispatch_log.push(record.clone());
        Ok(record)
    }

    async fn recent_dispatch_logs(
        &self,
        filter: DispatchLogFilter,
    ) -> Result<Vec<DispatchLogEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<DispatchLogEntry> = inner
            .dispatch_log
            .iter()
            .filter(|e| filter.user_id.map_or(true, |id| e.user_id == id))
            .filter(|e| filter.kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        entries.truncate(filter.limit.max(0) as usize);
        Ok(entries)
    }
}
