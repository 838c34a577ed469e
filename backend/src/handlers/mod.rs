//! HTTP request handlers for the weather alerting platform

pub mod alerts;
pub mod health;
pub mod locations;
pub mod logs;
pub mod runs;
pub mod weather;

pub use alerts::set_alert_enabled;
pub use health::health_check;
pub use locations::list_locations;
pub use logs::list_dispatch_logs;
pub use runs::trigger_run;
pub use weather::get_current_weather;
