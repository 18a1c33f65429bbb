//! Push channel adapter.

use super::transport::{
    PushDestination, PushMessage, PushTransport, PushTransportError, TopicManagementResponse,
};
use crate::config::{ConfigError, FieldOpsConfig};
use crate::identity::{
    domain::{AgentId, ChannelName, DeliveryToken, Topic},
    ports::IdentityDirectory,
};
use crate::notification::{
    domain::{Envelope, MembershipAction},
    ports::{ChannelAdapter, ChannelError, ChannelResult, MembershipReport, TokenFailure},
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Channel adapter over a token/topic push transport.
///
/// Tokens are looked up in the identity directory under this channel's
/// name. Every transport call is bounded by the configured send timeout.
pub struct PushChannel<T> {
    channel: ChannelName,
    transport: Arc<T>,
    identity: Arc<dyn IdentityDirectory>,
    send_timeout: Duration,
    closed: AtomicBool,
}

impl<T> std::fmt::Debug for PushChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushChannel")
            .field("channel", &self.channel)
            .field("send_timeout", &self.send_timeout)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T: PushTransport> PushChannel<T> {
    /// Creates a push channel.
    #[must_use]
    pub const fn new(
        channel: ChannelName,
        transport: Arc<T>,
        identity: Arc<dyn IdentityDirectory>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            transport,
            identity,
            send_timeout,
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a push channel named and bounded by configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChannelName`] when the configured name is
    /// invalid.
    pub fn from_config(
        config: &FieldOpsConfig,
        transport: Arc<T>,
        identity: Arc<dyn IdentityDirectory>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.push.channel_name()?,
            transport,
            identity,
            config.notification.send_timeout(),
        ))
    }

    /// Returns the channel name tokens are registered under.
    #[must_use]
    pub const fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// Stops the channel. Later calls fail with [`ChannelError::Closed`].
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(channel = %self.channel, "push channel shut down");
        }
    }

    /// Returns `true` after [`Self::shutdown`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ChannelResult<()> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        Ok(())
    }

    async fn bounded<R>(
        &self,
        call: impl Future<Output = Result<R, PushTransportError>> + Send,
    ) -> ChannelResult<R> {
        tokio::time::timeout(self.send_timeout, call)
            .await
            .map_err(|_elapsed| ChannelError::Timeout(self.send_timeout))?
            .map_err(channel_error)
    }

    async fn send(&self, destination: PushDestination, envelope: &Envelope) -> ChannelResult<()> {
        self.ensure_open()?;
        let message = PushMessage {
            destination,
            data: envelope.command().data(),
        };
        self.bounded(self.transport.send(&message)).await?;
        debug!(
            channel = %self.channel,
            envelope_id = %envelope.id(),
            command = %envelope.code(),
            "push message sent"
        );
        Ok(())
    }

    async fn manage(
        &self,
        tokens: &[DeliveryToken],
        topic: &Topic,
        action: MembershipAction,
    ) -> ChannelResult<MembershipReport> {
        self.ensure_open()?;
        let raw: Vec<String> = tokens.iter().map(|token| token.expose().to_owned()).collect();
        let response = match action {
            MembershipAction::Subscribe => {
                self.bounded(self.transport.subscribe_to_topic(&raw, topic.as_str()))
                    .await?
            }
            MembershipAction::Unsubscribe => {
                self.bounded(self.transport.unsubscribe_from_topic(&raw, topic.as_str()))
                    .await?
            }
        };
        Ok(membership_report(tokens, response))
    }
}

fn channel_error(err: PushTransportError) -> ChannelError {
    match err {
        PushTransportError::Unregistered(reason) => ChannelError::TokenInvalid(reason),
        PushTransportError::Unavailable(reason) => ChannelError::Transport(reason),
    }
}

fn membership_report(
    tokens: &[DeliveryToken],
    response: TopicManagementResponse,
) -> MembershipReport {
    let failures = response
        .failures
        .into_iter()
        .filter_map(|failure| {
            tokens
                .get(failure.index)
                .map(|token| TokenFailure::new(token.clone(), channel_error(failure.error)))
        })
        .collect();
    MembershipReport {
        succeeded: response.success_count,
        failures,
    }
}

#[async_trait]
impl<T: PushTransport + 'static> ChannelAdapter for PushChannel<T> {
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
        self.send(PushDestination::Token(token.expose().to_owned()), envelope)
            .await
    }

    async fn send_topic(&self, topic: &Topic, envelope: &Envelope) -> ChannelResult<()> {
        self.send(PushDestination::Topic(topic.as_str().to_owned()), envelope)
            .await
    }

    async fn subscribe(
        &self,
        tokens: &[DeliveryToken],
        topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        self.manage(tokens, topic, MembershipAction::Subscribe).await
    }

    async fn unsubscribe(
        &self,
        tokens: &[DeliveryToken],
        topic: &Topic,
    ) -> ChannelResult<MembershipReport> {
        self.manage(tokens, topic, MembershipAction::Unsubscribe)
            .await
    }
}
