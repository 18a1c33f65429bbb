//! Wire-level push transport seam.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Where a push message goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PushDestination {
    /// One device token.
    Token(String),
    /// A named topic.
    Topic(String),
}

impl PushDestination {
    /// Returns the raw destination string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Token(value) | Self::Topic(value) => value,
        }
    }
}

/// A data-only push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Destination.
    pub destination: PushDestination,
    /// Flat data payload.
    pub data: BTreeMap<String, String>,
}

/// Errors reported by a push transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushTransportError {
    /// The token is unknown to the push service and will never work again.
    #[error("token is not registered: {0}")]
    Unregistered(String),

    /// The service could not be reached or refused the request.
    #[error("push service unavailable: {0}")]
    Unavailable(String),
}

/// One rejected token in a topic management call, by position in the
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicManagementFailure {
    /// Index of the token in the request slice.
    pub index: usize,
    /// Why the token was rejected.
    pub error: PushTransportError,
}

/// Result of a topic subscribe or unsubscribe request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicManagementResponse {
    /// Number of tokens accepted.
    pub success_count: usize,
    /// Rejected tokens.
    pub failures: Vec<TopicManagementFailure>,
}

/// Client for a token/topic push service.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: &PushMessage) -> Result<(), PushTransportError>;

    /// Adds tokens to a topic.
    async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, PushTransportError>;

    /// Removes tokens from a topic.
    async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, PushTransportError>;
}
