//! Alert rule evaluation and dispatch
//!
//! One evaluation run gates every active rule (enabled, inside its time
//! window, out of cooldown), fetches weather once per distinct location, and
//! dispatches a message for every rule whose metric reached its threshold.
//! Each rule is an independent unit of work: a bad row, a dead provider or a
//! refused dispatch affects its own counter and nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::{AlertKind, AlertRule, Location, MessageKind, User, WeatherSnapshot};

use crate::services::aggregator::WeatherAggregator;
use crate::services::dispatcher::{alert_message, promo_message, NotificationDispatcher};
use crate::storage::{NewDispatchLog, Store, StoreError};

/// Outcome counters for one batch. Every unit of work lands in exactly one
/// bucket: `sent` delivered, `failed` attempted-but-refused or broken row,
/// `skipped` gated out or not evaluable (window, cooldown, provider outage,
/// unreported metric, threshold not reached).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Evaluates alert rules against fresh weather and drives the dispatcher.
#[derive(Clone)]
pub struct AlertEvaluator {
    store: Arc<dyn Store>,
    aggregator: Arc<WeatherAggregator>,
    dispatcher: Arc<NotificationDispatcher>,
    refire_cooldown: Duration,
    fetch_concurrency: usize,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn Store>,
        aggregator: Arc<WeatherAggregator>,
        dispatcher: Arc<NotificationDispatcher>,
        refire_cooldown_minutes: i64,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            store,
            aggregator,
            dispatcher,
            refire_cooldown: Duration::minutes(refire_cooldown_minutes),
            fetch_concurrency,
        }
    }

    /// Evaluate every active alert rule against `current_hour`.
    ///
    /// Errors only when the rule set itself cannot be loaded; every per-rule
    /// problem is absorbed into the returned counters.
    pub async fn evaluate_and_dispatch(
        &self,
        current_hour: u32,
    ) -> Result<BatchResult, StoreError> {
        let rules = self.store.active_alert_rules().await?;
        let now = Utc::now();
        let mut result = BatchResult::default();

        // Gate first so only rules that can actually fire cost a fetch.
        let mut runnable: Vec<AlertRule> = Vec::new();
        for rule in rules {
            if !rule.enabled {
                tracing::debug!("Rule {} skipped: disabled", rule.id);
                result.skipped += 1;
            } else if !rule.window.contains(current_hour) {
                tracing::debug!(
                    "Rule {} skipped: hour {} outside window {}-{}",
                    rule.id,
                    current_hour,
                    rule.window.start_hour,
                    rule.window.end_hour
                );
                result.skipped += 1;
            } else if self.in_cooldown(&rule, now) {
                tracing::debug!("Rule {} skipped: fired within cooldown", rule.id);
                result.skipped += 1;
            } else {
                runnable.push(rule);
            }
        }

        // Collected eagerly: a borrowing iterator held across the await
        // trips rustc's auto-trait check on the caller's future
        // (rust-lang/rust#89976).
        let rule_locations: Vec<Uuid> = runnable.iter().map(|r| r.location_id).collect();
        let locations = self.resolve_locations(rule_locations).await;
        let snapshots = self.prefetch_snapshots(&locations).await;

        for rule in runnable {
            self.evaluate_rule(&rule, &locations, &snapshots, &mut result)
                .await;
        }

        Ok(result)
    }

    /// Send the daily promotional message to every opted-in user.
    ///
    /// Reuses the alert dispatch/log path; there is no threshold logic and
    /// no cooldown, the external scheduler fires this once per day.
    pub async fn broadcast_promos(&self) -> Result<BatchResult, StoreError> {
        let users = self.store.promo_recipients().await?;
        let mut result = BatchResult::default();

        // Collected eagerly: see the note in `evaluate_and_dispatch`.
        let user_locations: Vec<Uuid> = users.iter().filter_map(|u| u.location_id).collect();
        let locations = self.resolve_locations(user_locations).await;
        let snapshots = self.prefetch_snapshots(&locations).await;

        for user in users {
            self.send_promo(&user, &locations, &snapshots, &mut result)
                .await;
        }

        Ok(result)
    }

    async fn evaluate_rule(
        &self,
        rule: &AlertRule,
        locations: &HashMap<Uuid, Option<Location>>,
        snapshots: &HashMap<Uuid, Option<WeatherSnapshot>>,
        result: &mut BatchResult,
    ) {
        let location = match locations.get(&rule.location_id) {
            Some(Some(location)) => location,
            _ => {
                result.failed += 1;
                return;
            }
        };

        // A provider outage must not read as "threshold not met".
        let snapshot = match snapshots.get(&rule.location_id) {
            Some(Some(snapshot)) => snapshot,
            _ => {
                tracing::debug!("Rule {} skipped: no weather for {}", rule.id, location.name);
                result.skipped += 1;
                return;
            }
        };

        let value = match metric_value(rule.kind, snapshot) {
            Some(value) => value,
            None => {
                tracing::debug!(
                    "Rule {} skipped: {} did not report {}",
                    rule.id,
                    snapshot.source,
                    rule.kind
                );
                result.skipped += 1;
                return;
            }
        };

        if value < rule.threshold {
            tracing::debug!(
                "Rule {} skipped: {} {} below threshold {}",
                rule.id,
                rule.kind,
                value,
                rule.threshold
            );
            result.skipped += 1;
            return;
        }

        let user = match self.store.find_user(rule.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Rule {} failed: user {} is missing", rule.id, rule.user_id);
                result.failed += 1;
                return;
            }
            Err(err) => {
                tracing::error!("Rule {} failed: loading user: {}", rule.id, err);
                result.failed += 1;
                return;
            }
        };

        if user.phone.is_empty() {
            tracing::debug!("Rule {} skipped: user {} has no phone", rule.id, user.id);
            result.skipped += 1;
            return;
        }

        let body = alert_message(&user.name, &location.name, rule.kind, value, rule.threshold);
        let delivered = self.dispatcher.send(&user.phone, &body).await;

        let entry = NewDispatchLog {
            user_id: user.id,
            alert_rule_id: Some(rule.id),
            kind: MessageKind::Alert,
            body,
            delivered,
        };
        if let Err(err) = self.store.append_dispatch_log(entry).await {
            tracing::error!("Rule {} failed: recording dispatch: {}", rule.id, err);
            result.failed += 1;
            return;
        }

        if delivered {
            if let Err(err) = self.store.mark_alert_rule_fired(rule.id, Utc::now()).await {
                tracing::error!("Failed to stamp rule {} as fired: {}", rule.id, err);
            }
            result.sent += 1;
        } else {
            result.failed += 1;
        }
    }

    async fn send_promo(
        &self,
        user: &User,
        locations: &HashMap<Uuid, Option<Location>>,
        snapshots: &HashMap<Uuid, Option<WeatherSnapshot>>,
        result: &mut BatchResult,
    ) {
        let Some(location_id) = user.location_id else {
            result.skipped += 1;
            return;
        };

        let location = match locations.get(&location_id) {
            Some(Some(location)) => location,
            _ => {
                result.failed += 1;
                return;
            }
        };

        let snapshot = match snapshots.get(&location_id) {
            Some(Some(snapshot)) => snapshot,
            _ => {
                tracing::debug!("Promo for {} skipped: no weather for {}", user.id, location.name);
                result.skipped += 1;
                return;
            }
        };

        let body = promo_message(&user.name, location, snapshot);
        let delivered = self.dispatcher.send(&user.phone, &body).await;

        let entry = NewDispatchLog {
            user_id: user.id,
            alert_rule_id: None,
            kind: MessageKind::Promo,
            body,
            delivered,
        };
        if let Err(err) = self.store.append_dispatch_log(entry).await {
            tracing::error!("Promo for {} failed: recording dispatch: {}", user.id, err);
            result.failed += 1;
            return;
        }

        if delivered {
            result.sent += 1;
        } else {
            result.failed += 1;
        }
    }

    fn in_cooldown(&self, rule: &AlertRule, now: DateTime<Utc>) -> bool {
        match rule.last_fired_at {
            Some(fired_at) => now - fired_at < self.refire_cooldown,
            None => false,
        }
    }

    /// Load each distinct referenced location once. `None` marks a location
    /// that could not be resolved; rules pointing at it count as failed.
    async fn resolve_locations(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> HashMap<Uuid, Option<Location>> {
        let mut out: HashMap<Uuid, Option<Location>> = HashMap::new();
        for id in ids {
            if out.contains_key(&id) {
                continue;
            }
            let loaded = match self.store.find_location(id).await {
                Ok(Some(location)) => Some(location),
                Ok(None) => {
                    tracing::warn!("Location {} is referenced but missing", id);
                    None
                }
                Err(err) => {
                    tracing::error!("Failed to load location {}: {}", id, err);
                    None
                }
            };
            out.insert(id, loaded);
        }
        out
    }

    /// One aggregator call per distinct location, bounded concurrency.
    ///
    /// Failures are cached as `None` for the rest of the run so an
    /// all-providers-down location is not hammered once per rule.
    async fn prefetch_snapshots(
        &self,
        locations: &HashMap<Uuid, Option<Location>>,
    ) -> HashMap<Uuid, Option<WeatherSnapshot>> {
        // The fetch futures are materialized before streaming so no
        // closure-bearing adapter is held across an await; rustc's
        // auto-trait check rejects that (rust-lang/rust#89976). Execution
        // still happens under `buffer_unordered`'s concurrency bound.
        let fetches: Vec<_> = locations
            .values()
            .flatten()
            .map(|location| async move {
                let fetched = self
                    .aggregator
                    .get_snapshot(&location.coordinates, None)
                    .await;
                if let Err(err) = &fetched {
                    tracing::warn!("Weather unavailable for {}: {}", location.name, err);
                }
                (location.id, fetched.ok())
            })
            .collect();
        stream::iter(fetches)
            .buffer_unordered(self.fetch_concurrency.max(1))
            .collect()
            .await
    }
}

/// The snapshot field a rule kind watches. `None` when the winning provider
/// did not report that metric.
fn metric_value(kind: AlertKind, snapshot: &WeatherSnapshot) -> Option<Decimal> {
    match kind {
        AlertKind::Rain => snapshot.precipitation_mm,
        AlertKind::Wind => snapshot.wind_speed_kmh,
        AlertKind::Temperature => Some(snapshot.temperature_celsius),
    }
}
