//! Channel adapter that records every call instead of delivering.

use crate::identity::{
    domain::{AgentId, ChannelName, DeliveryToken, Topic},
    ports::IdentityDirectory,
};
use crate::notification::{
    domain::{CommandCode, Envelope, EnvelopeId},
    ports::{ChannelAdapter, ChannelError, ChannelResult, MembershipReport, TokenFailure},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call observed by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `send_direct` was invoked.
    Direct {
        /// Raw token the envelope was sent to.
        token: String,
        /// Envelope command.
        command: CommandCode,
        /// Envelope id.
        envelope: EnvelopeId,
    },
    /// `send_topic` was invoked.
    Topic {
        /// Topic name.
        topic: String,
        /// Envelope command.
        command: CommandCode,
        /// Envelope id.
        envelope: EnvelopeId,
    },
    /// `subscribe` was invoked.
    Subscribe {
        /// Raw tokens.
        tokens: Vec<String>,
        /// Topic name.
        topic: String,
    },
    /// `unsubscribe` was invoked.
    Unsubscribe {
        /// Raw tokens.
        tokens: Vec<String>,
        /// Topic name.
        topic: String,
    },
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<RecordedCall>,
    invalid_tokens: HashSet<String>,
    direct_failure: Option<ChannelError>,
    topic_failure: Option<ChannelError>,
}

/// Records calls and resolves tokens through an identity directory.
///
/// Failures can be scripted per capability, and individual tokens can be
/// marked invalid so sends and membership calls to them report
/// [`ChannelError::TokenInvalid`].
#[derive(Clone)]
pub struct RecordingChannel {
    channel: ChannelName,
    identity: Arc<dyn IdentityDirectory>,
    supports_membership: bool,
    state: Arc<Mutex<RecordingState>>,
}

impl std::fmt::Debug for RecordingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingChannel")
            .field("channel", &self.channel)
            .field("supports_membership", &self.supports_membership)
            .finish_non_exhaustive()
    }
}

impl RecordingChannel {
    /// Creates a recorder for `channel` that does not support topic
    /// membership.
    #[must_use]
    pub fn new(channel: ChannelName, identity: Arc<dyn IdentityDirectory>) -> Self {
        Self {
            channel,
            identity,
            supports_membership: false,
            state: Arc::new(Mutex::new(RecordingState::default())),
        }
    }

    /// Enables subscribe and unsubscribe.
    #[must_use]
    pub const fn with_membership(mut self) -> Self {
        self.supports_membership = true;
        self
    }

    /// Makes every later direct send fail with `error`.
    pub fn fail_direct_sends(&self, error: ChannelError) {
        self.lock().direct_failure = Some(error);
    }

    /// Makes every later topic send fail with `error`.
    pub fn fail_topic_sends(&self, error: ChannelError) {
        self.lock().topic_failure = Some(error);
    }

    /// Marks a raw token as permanently invalid.
    pub fn mark_token_invalid(&self, token: impl Into<String>) {
        self.lock().invalid_tokens.insert(token.into());
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Returns the topics `send_topic` was called with, in order.
    #[must_use]
    pub fn topic_sends(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Topic { topic, .. } => Some(topic.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the tokens `send_direct` was called with, in order.
    #[must_use]
    pub fn direct_sends(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Direct { token, .. } => Some(token.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn membership(&self, tokens: &[DeliveryToken], call: RecordedCall) -> MembershipReport {
        let mut state = self.lock();
        state.calls.push(call);
        let mut report = MembershipReport::default();
        for token in tokens {
            if state.invalid_tokens.contains(token.expose()) {
                report.failures.push(TokenFailure::new(
                    token.clone(),
                    ChannelError::TokenInvalid("token not registered".to_owned()),
                ));
            } else {
                report.succeeded += 1;
            }
        }
        report
    }
}

fn raw_tokens(tokens: &[DeliveryToken]) -> Vec<String> {
    tokens.iter().map(|token| token.expose().to_owned()).collect()
}

#[async_trait]
impl ChannelAdapter for RecordingChannel {
    fn channel(&self) -> &ChannelName {
        &self.channel
    }

    async fn resolve_tokens(&self, agent: &AgentId) -> ChannelResult<Vec<String>> {
        self.identity
            .tokens(agent, &self.channel)
            .await
            .map_err(|err| ChannelError::Transport(err.to_string()))
    }

    async fn send_direct(&self, token: &DeliveryToken, envelope: &Envelope) -> ChannelResult<()> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Direct {
            token: token.expose().to_owned(),
            command: envelope.code(),
            envelope: envelope.id(),
        });
        if state.invalid_tokens.contains(token.expose()) {
            return Err(ChannelError::TokenInvalid("token not registered".to_owned()));
        }
        state.direct_failure.clone().map_or(Ok(()), Err)
    }

    async fn send_topic(&self, topic: &Topic, envelope: &Envelope) -> ChannelResult<()> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Topic {
            topic: topic.as_str().to_owned(),
            command: envelope.code(),
            envelope: envelope.id(),
        });
        state.topic_failure.clone().map_or(Ok(()), Err)
    }

    async fn subscribe(
        &self,
        tokens: &[DeliveryToken],
        topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        if !self.supports_membership {
            return Err(ChannelError::Unsupported("subscribe"));
        }
        let call = RecordedCall::Subscribe {
            tokens: raw_tokens(tokens),
            topic: topic.as_str().to_owned(),
        };
        Ok(self.membership(tokens, call))
    }

    async fn unsubscribe(
        &self,
        tokens: &[DeliveryToken],
        topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        if !self.supports_membership {
            return Err(ChannelError::Unsupported("unsubscribe"));
        }
        let call = RecordedCall::Unsubscribe {
            tokens: raw_tokens(tokens),
            topic: topic.as_str().to_owned(),
        };
        Ok(self.membership(tokens, call))
    }
}
