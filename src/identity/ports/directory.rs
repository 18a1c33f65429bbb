//! Directory port for delivery tokens, messaging capability and teams.

use crate::identity::domain::{AgentId, ChannelName, TeamId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity directory operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity lookups consumed by the notification layer.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Returns the raw tokens registered for an agent on a channel.
    ///
    /// Values are returned as stored and may include blank entries; callers
    /// are expected to skip them.
    async fn tokens(&self, agent: &AgentId, channel: &ChannelName) -> IdentityResult<Vec<String>>;

    /// Registers a token for an agent on a channel. Registering an existing
    /// token is a no-op.
    async fn add_token(
        &self,
        agent: &AgentId,
        channel: &ChannelName,
        token: &str,
    ) -> IdentityResult<()>;

    /// Removes a token from an agent's channel registration.
    ///
    /// Returns `true` when a token was removed.
    async fn remove_token(
        &self,
        agent: &AgentId,
        channel: &ChannelName,
        token: &str,
    ) -> IdentityResult<bool>;

    /// Reports whether `from` may send a personal notification to `to`.
    async fn can_send_to(&self, from: &AgentId, to: &AgentId) -> IdentityResult<bool>;

    /// Lists the members of a team.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownTeam`] when the team does not exist.
    async fn team_members(&self, team: &TeamId) -> IdentityResult<Vec<AgentId>>;
}

/// Errors returned by identity directory implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// The team is not known to the directory.
    #[error("unknown team: {0}")]
    UnknownTeam(TeamId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
