//! Business logic services for the weather alerting platform

pub mod aggregator;
pub mod dispatcher;
pub mod evaluator;
pub mod orchestrator;

pub use aggregator::{AggregateError, WeatherAggregator};
pub use dispatcher::NotificationDispatcher;
pub use evaluator::{AlertEvaluator, BatchResult};
pub use orchestrator::{RunOrchestrator, RunReport};
