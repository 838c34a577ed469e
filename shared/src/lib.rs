//! Shared types and models for the SMI Weather Alert Platform
//!
//! This crate contains the domain model shared between the backend service
//! and its integration tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
