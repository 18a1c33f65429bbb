//! Fieldops: task graph and notification bus for field operations.
//!
//! Operations are planning documents made of map tasks (markers and links)
//! that agents claim, acknowledge and complete. This crate keeps each
//! operation's task, dependency and assignment graph consistent under
//! concurrent mutation, and turns committed changes into notifications that
//! fan out over every registered delivery channel.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, push services, etc.)
//!
//! # Modules
//!
//! - [`identity`]: Agents, teams, delivery tokens and the identity directory
//! - [`task`]: Operations, tasks, dependencies, assignments and lifecycle
//! - [`notification`]: Commands, envelopes, channel adapters and the bus
//! - [`config`]: Runtime configuration
//! - [`telemetry`]: Tracing subscriber set-up

pub mod config;
pub mod identity;
pub mod notification;
pub mod task;
pub mod telemetry;
