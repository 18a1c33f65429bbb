//! Agent and team identity for field operations.
//!
//! Identities are opaque keys used everywhere else in the crate. The
//! directory port resolves per-channel delivery tokens for an agent, prunes
//! tokens a channel has reported as permanently invalid, answers the
//! "may this agent message that agent" capability check, and lists team
//! membership. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
