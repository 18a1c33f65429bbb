//! Port contracts for notification channels.

pub mod channel;

pub use channel::{ChannelAdapter, ChannelError, ChannelResult, MembershipReport, TokenFailure};
