//! PostgreSQL-backed [`Store`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{
    AlertKind, AlertRule, AlertWindow, DispatchLogEntry, GpsCoordinates, Location, MessageKind,
    User,
};

use super::{DispatchLogFilter, NewDispatchLog, Store, StoreError};

/// Production store on a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database shape of an alert rule; enums travel as text columns.
#[derive(Debug, FromRow)]
struct AlertRuleRow {
    id: Uuid,
    user_id: Uuid,
    location_id: Uuid,
    kind: String,
    threshold: Decimal,
    start_hour: i32,
    end_hour: i32,
    enabled: bool,
    last_fired_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRuleRow> for AlertRule {
    type Error = StoreError;

    fn try_from(row: AlertRuleRow) -> Result<Self, StoreError> {
        let kind = row
            .kind
            .parse::<AlertKind>()
            .map_err(|e| StoreError::Corrupt(format!("alert rule {}: {}", row.id, e)))?;
        Ok(AlertRule {
            id: row.id,
            user_id: row.user_id,
            location_id: row.location_id,
            kind,
            threshold: row.threshold,
            window: AlertWindow::new(row.start_hour as u32, row.end_hour as u32),
            enabled: row.enabled,
            last_fired_at: row.last_fired_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    phone: String,
    location_id: Option<Uuid>,
    accepts_promos: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            phone: row.phone,
            location_id: row.location_id,
            accepts_promos: row.accepts_promos,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    region: String,
    latitude: Decimal,
    longitude: Decimal,
    created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            region: row.region,
            coordinates: GpsCoordinates::new(row.latitude, row.longitude),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DispatchLogRow {
    id: Uuid,
    user_id: Uuid,
    alert_rule_id: Option<Uuid>,
    kind: String,
    body: String,
    delivered: bool,
    sent_at: DateTime<Utc>,
}

impl TryFrom<DispatchLogRow> for DispatchLogEntry {
    type Error = StoreError;

    fn try_from(row: DispatchLogRow) -> Result<Self, StoreError> {
        let kind = row
            .kind
            .parse::<MessageKind>()
            .map_err(|e| StoreError::Corrupt(format!("dispatch log {}: {}", row.id, e)))?;
        Ok(DispatchLogEntry {
            id: row.id,
            user_id: row.user_id,
            alert_rule_id: row.alert_rule_id,
            kind,
            body: row.body,
            delivered: row.delivered,
            sent_at: row.sent_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn active_alert_rules(&self) -> Result<Vec<AlertRule>, StoreError> {
        let rows = sqlx::query_as::<_, AlertRuleRow>(
            r#"
            SELECT id, user_id, location_id, kind, threshold, start_hour, end_hour,
                   enabled, last_fired_at, created_at
            FROM alert_rules
            WHERE enabled = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AlertRule::try_from).collect()
    }

    async fn find_alert_rule(&self, id: Uuid) -> Result<Option<AlertRule>, StoreError> {
        let row = sqlx::query_as::<_, AlertRuleRow>(
            r#"
            SELECT id, user_id, location_id, kind, threshold, start_hour, end_hour,
                   enabled, last_fired_at, created_at
            FROM alert_rules
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(AlertRule::try_from).transpose()
    }

    async fn set_alert_rule_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<AlertRule>, StoreError> {
        let row = sqlx::query_as::<_, AlertRuleRow>(
            r#"
            UPDATE alert_rules
            SET enabled = $2
            WHERE id = $1
            RETURNING id, user_id, location_id, kind, threshold, start_hour, end_hour,
                      enabled, last_fired_at, created_at
            "#,
        )
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.db)
        .await?;

        row.map(AlertRule::try_from).transpose()
    }

    async fn mark_alert_rule_fired(
        &self,
        id: Uuid,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE alert_rules SET last_fired_at = $2 WHERE id = $1")
            .bind(id)
            .bind(fired_at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, phone, location_id, accepts_promos, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(User::from))
    }

    async fn promo_recipients(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, phone, location_id, accepts_promos, created_at
            FROM users
            WHERE accepts_promos = TRUE AND phone <> '' AND location_id IS NOT NULL
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, name, region, latitude, longitude, created_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Location::from))
    }

    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, name, region, latitude, longitude, created_at
            FROM locations
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn append_dispatch_log(
        &self,
        entry: NewDispatchLog,
    ) -> Result<DispatchLogEntry, StoreError> {
        let row = sqlx::query_as::<_, DispatchLogRow>(
            r#"
            INSERT INTO dispatch_log (user_id, alert_rule_id, kind, body, delivered)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, alert_rule_id, kind, body, delivered, sent_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.alert_rule_id)
        .bind(entry.kind.as_str())
        .bind(&entry.body)
        .bind(entry.delivered)
        .fetch_one(&self.db)
        .await?;

        DispatchLogEntry::try_from(row)
    }

    async fn recent_dispatch_logs(
        &self,
        filter: DispatchLogFilter,
    ) -> Result<Vec<DispatchLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, DispatchLogRow>(
            r#"
            SELECT id, user_id, alert_rule_id, kind, body, delivered, sent_at
            FROM dispatch_log
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY sent_at DESC
            LIMIT $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(DispatchLogEntry::try_from).collect()
    }
}
