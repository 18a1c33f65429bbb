//! Notification bus: the channel registry and per-envelope fan-out.

use crate::identity::domain::{AgentId, ChannelName, DeliveryToken, Topic};
use crate::notification::{
    domain::{Addressing, Envelope, EnvelopeId, MembershipAction},
    ports::{ChannelAdapter, ChannelError, TokenFailure},
};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// What one channel did with one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    channel: ChannelName,
    token_channel: ChannelName,
    attempted: usize,
    delivered: usize,
    token_failures: Vec<TokenFailure>,
    error: Option<ChannelError>,
}

impl ChannelOutcome {
    const fn new(channel: ChannelName, token_channel: ChannelName) -> Self {
        Self {
            channel,
            token_channel,
            attempted: 0,
            delivered: 0,
            token_failures: Vec::new(),
            error: None,
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub const fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// Returns the identity-directory channel the adapter's tokens belong
    /// to.
    #[must_use]
    pub const fn token_channel(&self) -> &ChannelName {
        &self.token_channel
    }

    /// Returns how many deliveries were attempted.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.attempted
    }

    /// Returns how many deliveries succeeded.
    #[must_use]
    pub const fn delivered(&self) -> usize {
        self.delivered
    }

    /// Returns the per-token failures.
    #[must_use]
    pub fn token_failures(&self) -> &[TokenFailure] {
        &self.token_failures
    }

    /// Returns the channel-level failure, if the channel could not run at
    /// all (token resolution failed, topic send failed, capability missing).
    #[must_use]
    pub const fn error(&self) -> Option<&ChannelError> {
        self.error.as_ref()
    }

    /// Returns `true` when nothing failed on this channel.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.token_failures.is_empty()
    }
}

/// Per-channel results of one dispatch, ordered by channel name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    envelope_id: EnvelopeId,
    outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    /// Returns the dispatched envelope's id.
    #[must_use]
    pub const fn envelope_id(&self) -> EnvelopeId {
        self.envelope_id
    }

    /// Returns every channel outcome.
    #[must_use]
    pub fn outcomes(&self) -> &[ChannelOutcome] {
        &self.outcomes
    }

    /// Returns the outcome for one channel.
    #[must_use]
    pub fn outcome(&self, channel: &ChannelName) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.channel() == channel)
    }

    /// Returns every token a channel reported as permanently invalid, keyed
    /// by the identity-directory channel the token is stored under.
    #[must_use]
    pub fn invalid_tokens(&self) -> Vec<(ChannelName, DeliveryToken)> {
        self.outcomes
            .iter()
            .flat_map(|outcome| {
                outcome
                    .token_failures
                    .iter()
                    .filter(|failure| failure.error.is_token_invalid())
                    .map(|failure| (outcome.token_channel.clone(), failure.token.clone()))
            })
            .collect()
    }

    /// Returns `true` when every channel ran without failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(ChannelOutcome::is_clean)
    }
}

type Registry = BTreeMap<ChannelName, Arc<dyn ChannelAdapter>>;

/// Registry of channel adapters that fans each envelope out to all of them.
///
/// Adapters run concurrently and independently: a failing or slow adapter
/// neither blocks nor cancels the others. The bus never retries.
#[derive(Default)]
pub struct NotificationBus {
    channels: RwLock<Registry>,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("channels", &self.channel_names())
            .finish()
    }
}

impl NotificationBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under `name`, replacing any previous adapter with
    /// that name. Returns the replaced adapter.
    pub fn register(
        &self,
        name: ChannelName,
        adapter: Arc<dyn ChannelAdapter>,
    ) -> Option<Arc<dyn ChannelAdapter>> {
        debug!(channel = %name, "channel registered");
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, adapter)
    }

    /// Returns the registered channel names in order.
    #[must_use]
    pub fn channel_names(&self) -> Vec<ChannelName> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Fans the envelope out to every registered adapter.
    ///
    /// Never fails: per-channel and per-token problems are logged and
    /// recorded in the returned report.
    pub async fn dispatch(&self, envelope: &Envelope) -> DispatchReport {
        let snapshot: Vec<(ChannelName, Arc<dyn ChannelAdapter>)> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, adapter)| (name.clone(), Arc::clone(adapter)))
            .collect();

        let shared = Arc::new(envelope.clone());
        let mut deliveries = JoinSet::new();
        for (name, adapter) in snapshot {
            let item = Arc::clone(&shared);
            deliveries.spawn(async move { deliver(name, adapter.as_ref(), &item).await });
        }

        let mut outcomes = Vec::with_capacity(deliveries.len());
        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => {
                    error!(
                        envelope_id = %envelope.id(),
                        error = %join_error,
                        "channel delivery task aborted"
                    );
                }
            }
        }
        outcomes.sort_by(|left, right| left.channel.cmp(&right.channel));

        DispatchReport {
            envelope_id: envelope.id(),
            outcomes,
        }
    }
}

async fn deliver(
    channel: ChannelName,
    adapter: &dyn ChannelAdapter,
    envelope: &Envelope,
) -> ChannelOutcome {
    let mut outcome = ChannelOutcome::new(channel, adapter.channel().clone());
    match envelope.command().addressing() {
        Addressing::Direct(agent) => deliver_direct(&mut outcome, adapter, agent, envelope).await,
        Addressing::Topic(team) => {
            let topic = Topic::for_team(team);
            outcome.attempted = 1;
            match adapter.send_topic(&topic, envelope).await {
                Ok(()) => outcome.delivered = 1,
                Err(err) => {
                    warn!(
                        channel = %outcome.channel,
                        envelope_id = %envelope.id(),
                        topic = %topic,
                        error = %err,
                        "topic send failed"
                    );
                    outcome.error = Some(err);
                }
            }
        }
        Addressing::Membership {
            agent,
            team,
            action,
        } => {
            let topic = Topic::for_team(team);
            deliver_membership(&mut outcome, adapter, agent, &topic, action, envelope).await;
        }
    }
    outcome
}

async fn deliver_direct(
    outcome: &mut ChannelOutcome,
    adapter: &dyn ChannelAdapter,
    agent: &AgentId,
    envelope: &Envelope,
) {
    let Some(tokens) = resolve(outcome, adapter, agent, envelope).await else {
        return;
    };
    for token in tokens {
        outcome.attempted += 1;
        match adapter.send_direct(&token, envelope).await {
            Ok(()) => outcome.delivered += 1,
            Err(err) => {
                warn!(
                    channel = %outcome.channel,
                    envelope_id = %envelope.id(),
                    token = %token.fingerprint(),
                    error = %err,
                    "direct send failed"
                );
                outcome.token_failures.push(TokenFailure::new(token, err));
            }
        }
    }
}

async fn deliver_membership(
    outcome: &mut ChannelOutcome,
    adapter: &dyn ChannelAdapter,
    agent: &AgentId,
    topic: &Topic,
    action: MembershipAction,
    envelope: &Envelope,
) {
    let Some(tokens) = resolve(outcome, adapter, agent, envelope).await else {
        return;
    };
    if tokens.is_empty() {
        return;
    }
    outcome.attempted = tokens.len();
    let result = match action {
        MembershipAction::Subscribe => adapter.subscribe(&tokens, topic).await,
        MembershipAction::Unsubscribe => adapter.unsubscribe(&tokens, topic).await,
    };
    match result {
        Ok(report) => {
            outcome.delivered = report.succeeded;
            outcome.token_failures = report.failures;
        }
        Err(ChannelError::Unsupported(capability)) => {
            debug!(channel = %outcome.channel, capability, "membership not supported");
            outcome.attempted = 0;
            outcome.error = Some(ChannelError::Unsupported(capability));
        }
        Err(err) => {
            warn!(
                channel = %outcome.channel,
                envelope_id = %envelope.id(),
                topic = %topic,
                error = %err,
                "topic membership change failed"
            );
            outcome.error = Some(err);
        }
    }
}

async fn resolve(
    outcome: &mut ChannelOutcome,
    adapter: &dyn ChannelAdapter,
    agent: &AgentId,
    envelope: &Envelope,
) -> Option<Vec<DeliveryToken>> {
    match adapter.resolve_tokens(agent).await {
        Ok(raw) => Some(
            raw.into_iter()
                .filter_map(|value| DeliveryToken::new(value).ok())
                .collect(),
        ),
        Err(err) => {
            warn!(
                channel = %outcome.channel,
                envelope_id = %envelope.id(),
                agent = %agent,
                error = %err,
                "token resolution failed"
            );
            outcome.error = Some(err);
            None
        }
    }
}
