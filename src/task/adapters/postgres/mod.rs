//! `PostgreSQL` adapters for task graph persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresTaskGraphStore, TaskGraphPgPool};
