//! Port contracts for task graph persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod store;

pub use store::{GraphTransaction, TaskGraphError, TaskGraphResult, TaskGraphStore};
