//! Scheduled run entry point
//!
//! An external scheduler hits the run trigger once per hour; everything the
//! platform sends goes out through one `run_once` pass. The promotional
//! broadcast piggybacks on the hourly run and fires only when the local hour
//! matches the configured promo hour. Phase errors are absorbed into the
//! report so a broken store never turns into a crashed run.

use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::services::evaluator::{AlertEvaluator, BatchResult};

/// Summary of one scheduled run, serialized back to the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    /// Local civil hour the run evaluated against.
    pub hour: u32,
    pub promos: BatchResult,
    pub alerts: BatchResult,
    /// Phase-level failures (e.g. the rule set could not be loaded); empty
    /// on a clean run.
    pub errors: Vec<String>,
}

/// Drives promo and alert batches for one scheduler tick.
#[derive(Clone)]
pub struct RunOrchestrator {
    evaluator: Arc<AlertEvaluator>,
    promo_hour: u32,
    utc_offset_hours: i32,
}

impl RunOrchestrator {
    pub fn new(evaluator: Arc<AlertEvaluator>, promo_hour: u32, utc_offset_hours: i32) -> Self {
        Self {
            evaluator,
            promo_hour,
            utc_offset_hours,
        }
    }

    /// Execute one full run at the current instant.
    ///
    /// Never errors: each phase's failure is logged and carried in the
    /// report. The external scheduler guarantees runs do not overlap.
    pub async fn run_once(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    async fn run_at(&self, started_at: DateTime<Utc>) -> RunReport {
        let hour = self.local_hour(started_at);
        tracing::info!("Starting scheduled run at local hour {}", hour);

        let mut errors = Vec::new();

        let promos = if hour == self.promo_hour {
            match self.evaluator.broadcast_promos().await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!("Promo broadcast failed: {}", err);
                    errors.push(format!("promo broadcast: {}", err));
                    BatchResult::default()
                }
            }
        } else {
            BatchResult::default()
        };

        let alerts = match self.evaluator.evaluate_and_dispatch(hour).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Alert evaluation failed: {}", err);
                errors.push(format!("alert evaluation: {}", err));
                BatchResult::default()
            }
        };

        tracing::info!(
            "Run finished: alerts sent={} failed={} skipped={}, promos sent={} failed={} skipped={}",
            alerts.sent,
            alerts.failed,
            alerts.skipped,
            promos.sent,
            promos.failed,
            promos.skipped
        );

        RunReport {
            started_at,
            hour,
            promos,
            alerts,
            errors,
        }
    }

    fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        (instant + Duration::hours(i64::from(self.utc_offset_hours))).hour()
    }
}
