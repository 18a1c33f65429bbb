//! Reference push-notification channel.
//!
//! [`PushChannel`] adapts any [`PushTransport`] (a token/topic push service
//! such as a mobile messaging gateway) to the [`crate::notification::ports::ChannelAdapter`]
//! port. The transport is a seam so the channel logic (token resolution,
//! timeouts, invalid-token mapping and shutdown) is testable with
//! [`InMemoryPushTransport`].

mod channel;
mod memory;
mod transport;

pub use channel::PushChannel;
pub use memory::InMemoryPushTransport;
pub use transport::{
    PushDestination, PushMessage, PushTransport, PushTransportError, TopicManagementFailure,
    TopicManagementResponse,
};
