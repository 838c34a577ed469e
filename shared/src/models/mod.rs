//! Domain models for the SMI Weather Alert Platform

mod alert;
mod dispatch_log;
mod location;
mod user;
mod weather;

pub use alert::*;
pub use dispatch_log::*;
pub use location::*;
pub use user::*;
pub use weather::*;
