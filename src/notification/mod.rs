//! Multi-channel notification bus.
//!
//! Graph and identity events become [`domain::Command`]s wrapped in
//! [`domain::Envelope`]s. The [`services::NotificationBus`] fans each
//! envelope out to every registered [`ports::ChannelAdapter`] concurrently;
//! personal commands resolve the recipient's tokens per channel, collective
//! commands go to the team topic once per channel. Failures are recorded in
//! a [`services::DispatchReport`] rather than raised, and the
//! [`services::Dispatcher`] prunes tokens that channels report as
//! permanently invalid.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
