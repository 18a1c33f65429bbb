//! Channel adapter port: one implementation per notification medium.

use crate::identity::domain::{AgentId, ChannelName, DeliveryToken, Topic};
use crate::notification::domain::Envelope;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for channel adapter calls.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Delivery errors reported by channel adapters.
///
/// Only [`ChannelError::TokenInvalid`] means the address will never work
/// again; every other variant is treated as transient.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The token is permanently invalid and should be pruned.
    #[error("delivery token is no longer valid: {0}")]
    TokenInvalid(String),

    /// The transport failed; the address may still be valid.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The send did not finish within the adapter's timeout.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The adapter does not implement the requested capability.
    #[error("channel does not support {0}")]
    Unsupported(&'static str),

    /// The adapter has been shut down.
    #[error("channel is closed")]
    Closed,
}

impl ChannelError {
    /// Returns `true` when the failing token should be pruned.
    #[must_use]
    pub const fn is_token_invalid(&self) -> bool {
        matches!(self, Self::TokenInvalid(_))
    }
}

/// A per-token failure from a membership call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFailure {
    /// Token that failed.
    pub token: DeliveryToken,
    /// Why it failed.
    pub error: ChannelError,
}

impl TokenFailure {
    /// Creates a token failure.
    #[must_use]
    pub const fn new(token: DeliveryToken, error: ChannelError) -> Self {
        Self { token, error }
    }
}

/// Outcome of a topic subscribe or unsubscribe call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipReport {
    /// Tokens the channel accepted.
    pub succeeded: usize,
    /// Tokens the channel rejected.
    pub failures: Vec<TokenFailure>,
}

impl MembershipReport {
    /// Iterates over tokens reported as permanently invalid.
    pub fn invalid_tokens(&self) -> impl Iterator<Item = &DeliveryToken> {
        self.failures
            .iter()
            .filter(|failure| failure.error.is_token_invalid())
            .map(|failure| &failure.token)
    }
}

/// Capability set of one notification medium.
///
/// Sends are best effort and bounded by the adapter's own timeout.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Returns the channel name the adapter's tokens are stored under in
    /// the identity directory. Invalid tokens are pruned under this name,
    /// whatever name the adapter is registered with on the bus.
    fn channel(&self) -> &ChannelName;

    /// Resolves the raw channel-specific tokens of an agent. Entries may be
    /// blank; callers skip them.
    async fn resolve_tokens(&self, agent: &AgentId) -> ChannelResult<Vec<String>>;

    /// Delivers an envelope to one token.
    async fn send_direct(&self, token: &DeliveryToken, envelope: &Envelope) -> ChannelResult<()>;

    /// Delivers an envelope to a team topic.
    async fn send_topic(&self, topic: &Topic, envelope: &Envelope) -> ChannelResult<()>;

    /// Adds tokens to a topic, reporting per-token failures.
    async fn subscribe(
        &self,
        _tokens: &[DeliveryToken],
        _topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        Err(ChannelError::Unsupported("subscribe"))
    }

    /// Removes tokens from a topic, reporting per-token failures.
    async fn unsubscribe(
        &self,
        _tokens: &[DeliveryToken],
        _topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        Err(ChannelError::Unsupported("unsubscribe"))
    }
}
