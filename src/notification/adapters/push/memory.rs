//! In-memory push transport.

use super::transport::{
    PushDestination, PushMessage, PushTransport, PushTransportError, TopicManagementFailure,
    TopicManagementResponse,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct TransportState {
    sent: Vec<PushMessage>,
    unregistered: HashSet<String>,
    unavailable: HashSet<String>,
    topics: BTreeMap<String, BTreeSet<String>>,
}

/// Push transport that keeps messages and topic membership in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPushTransport {
    state: Arc<Mutex<TransportState>>,
    latency: Option<Duration>,
}

impl InMemoryPushTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every send by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the service report `token` as unregistered.
    pub fn mark_unregistered(&self, token: impl Into<String>) {
        self.lock().unregistered.insert(token.into());
    }

    /// Makes sends to `destination` (token or topic) fail as unavailable.
    pub fn fail_destination(&self, destination: impl Into<String>) {
        self.lock().unavailable.insert(destination.into());
    }

    /// Returns every delivered message in order.
    #[must_use]
    pub fn sent(&self) -> Vec<PushMessage> {
        self.lock().sent.clone()
    }

    /// Returns the tokens currently subscribed to `topic`.
    #[must_use]
    pub fn topic_members(&self, topic: &str) -> Vec<String> {
        self.lock()
            .topics
            .get(topic)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn manage(&self, tokens: &[String], topic: &str, join: bool) -> TopicManagementResponse {
        let mut state = self.lock();
        let mut response = TopicManagementResponse::default();
        for (index, token) in tokens.iter().enumerate() {
            if state.unregistered.contains(token) {
                response.failures.push(TopicManagementFailure {
                    index,
                    error: PushTransportError::Unregistered(token.clone()),
                });
                continue;
            }
            let members = state.topics.entry(topic.to_owned()).or_default();
            if join {
                members.insert(token.clone());
            } else {
                members.remove(token);
            }
            response.success_count += 1;
        }
        response
    }
}

#[async_trait]
impl PushTransport for InMemoryPushTransport {
    async fn send(&self, message: &PushMessage) -> Result<(), PushTransportError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.lock();
        let destination = message.destination.as_str();
        if state.unavailable.contains(destination) {
            return Err(PushTransportError::Unavailable(destination.to_owned()));
        }
        if let PushDestination::Token(token) = &message.destination
            && state.unregistered.contains(token)
        {
            return Err(PushTransportError::Unregistered(token.clone()));
        }
        state.sent.push(message.clone());
        Ok(())
    }

    async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, PushTransportError> {
        Ok(self.manage(tokens, topic, true))
    }

    async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, PushTransportError> {
        Ok(self.manage(tokens, topic, false))
    }
}
