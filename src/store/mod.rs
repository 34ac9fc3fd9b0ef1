//! Data store access for the monitoring pipeline
//!
//! The pipeline talks to a relational store through the [`DataStore`]
//! trait. Two implementations exist:
//!
//! - [`postgres::PgStore`] - the production backend
//! - [`memory::MemoryStore`] - in-memory backend for tests

pub mod backend;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use backend::{DataStore, HealthStatus};
pub use error::{StoreError, StoreResult};
