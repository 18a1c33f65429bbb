//! Task graph for field operations.
//!
//! An operation owns tasks (map markers and links). Each task carries a
//! lifecycle state, a dependency set and an assignee set. Dependency and
//! assignment writes use replace-all semantics inside one transaction, and
//! assignment changes keep the task state in step (`assigned` when agents
//! are written, `pending` when cleared or rejected). The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
