//! Dispatcher: turns graph and identity events into envelopes and prunes
//! tokens the channels report as dead.

use super::bus::{DispatchReport, NotificationBus};
use crate::config::NotificationConfig;
use crate::identity::{
    domain::{AgentId, TeamId},
    ports::{IdentityDirectory, IdentityError},
};
use crate::notification::domain::{Command, Envelope};
use crate::task::domain::{OperationId, Task, TaskKind};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised before a dispatch starts.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The sender may not message the recipient.
    #[error("agent {from} may not message agent {to}")]
    Forbidden {
        /// Sending agent.
        from: AgentId,
        /// Intended recipient.
        to: AgentId,
    },

    /// The identity layer failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Result type for dispatcher operations that can fail before fan-out.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Builds envelopes from domain events and hands them to the bus.
#[derive(Clone)]
pub struct Dispatcher {
    bus: Arc<NotificationBus>,
    identity: Arc<dyn IdentityDirectory>,
    clock: Arc<dyn Clock + Send + Sync>,
    prune_invalid_tokens: bool,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bus", &self.bus)
            .field("prune_invalid_tokens", &self.prune_invalid_tokens)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher that prunes invalid tokens.
    #[must_use]
    pub fn new(
        bus: Arc<NotificationBus>,
        identity: Arc<dyn IdentityDirectory>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            bus,
            identity,
            clock,
            prune_invalid_tokens: true,
        }
    }

    /// Creates a dispatcher with pruning taken from configuration.
    #[must_use]
    pub fn from_config(
        config: &NotificationConfig,
        bus: Arc<NotificationBus>,
        identity: Arc<dyn IdentityDirectory>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self::new(bus, identity, clock).with_token_pruning(config.prune_invalid_tokens)
    }

    /// Enables or disables pruning of tokens reported as invalid.
    #[must_use]
    pub const fn with_token_pruning(mut self, enabled: bool) -> Self {
        self.prune_invalid_tokens = enabled;
        self
    }

    /// Returns the bus this dispatcher feeds.
    #[must_use]
    pub const fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    /// Wraps a command in an envelope, fans it out and prunes dead tokens.
    pub async fn dispatch(&self, command: Command) -> DispatchReport {
        let envelope = Envelope::new(command, self.clock.as_ref());
        self.dispatch_envelope(&envelope).await
    }

    /// Fans out an already built envelope and prunes dead tokens.
    pub async fn dispatch_envelope(&self, envelope: &Envelope) -> DispatchReport {
        debug!(
            envelope_id = %envelope.id(),
            command = %envelope.code(),
            "dispatching envelope"
        );
        let report = self.bus.dispatch(envelope).await;
        if self.prune_invalid_tokens
            && let Some(agent) = envelope.command().recipient()
        {
            self.prune(agent, &report).await;
        }
        report
    }

    /// Sends a free-text message after checking the sender may reach the
    /// recipient.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Forbidden`] when the identity layer denies
    /// the message, or [`DispatchError::Identity`] when the check fails.
    pub async fn send_message(
        &self,
        from: &AgentId,
        to: &AgentId,
        message: impl Into<String>,
    ) -> DispatchResult<DispatchReport> {
        if !self.identity.can_send_to(from, to).await? {
            return Err(DispatchError::Forbidden {
                from: from.clone(),
                to: to.clone(),
            });
        }
        let command = Command::GenericMessage {
            agent: to.clone(),
            message: message.into(),
        };
        Ok(self.dispatch(command).await)
    }

    /// Tells `agent` they were assigned `task`.
    pub async fn task_assigned(&self, task: &Task, agent: &AgentId) -> DispatchReport {
        let message = "assigned".to_owned();
        let command = match task.kind() {
            TaskKind::Marker => Command::MarkerAssignmentChange {
                agent: agent.clone(),
                marker: task.task_ref().clone(),
                message,
            },
            TaskKind::Link => Command::LinkAssignmentChange {
                agent: agent.clone(),
                link: task.task_ref().clone(),
                message,
            },
        };
        self.dispatch(command).await
    }

    /// Broadcasts the task's current state to every team.
    pub async fn task_status_changed(&self, task: &Task, teams: &[TeamId]) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(teams.len());
        for team in teams {
            let message = task.state().as_str().to_owned();
            let command = match task.kind() {
                TaskKind::Marker => Command::MarkerStatusChange {
                    team: team.clone(),
                    marker: task.task_ref().clone(),
                    message,
                },
                TaskKind::Link => Command::LinkStatusChange {
                    team: team.clone(),
                    link: task.task_ref().clone(),
                    message,
                },
            };
            reports.push(self.dispatch(command).await);
        }
        reports
    }

    /// Broadcasts that an operation's map changed.
    pub async fn map_changed(
        &self,
        operation: &OperationId,
        teams: &[TeamId],
        message: &str,
    ) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(teams.len());
        for team in teams {
            let command = Command::MapChange {
                team: team.clone(),
                operation: operation.clone(),
                message: message.to_owned(),
            };
            reports.push(self.dispatch(command).await);
        }
        reports
    }

    /// Broadcasts that `agent` logged in.
    pub async fn agent_logged_in(
        &self,
        agent: &AgentId,
        teams: &[TeamId],
        message: &str,
    ) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(teams.len());
        for team in teams {
            let command = Command::AgentLogin {
                team: team.clone(),
                agent: agent.clone(),
                message: message.to_owned(),
            };
            reports.push(self.dispatch(command).await);
        }
        reports
    }

    /// Broadcasts that `agent` reported a new location.
    pub async fn agent_moved(
        &self,
        agent: &AgentId,
        teams: &[TeamId],
        message: &str,
    ) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(teams.len());
        for team in teams {
            let command = Command::AgentLocationChange {
                team: team.clone(),
                agent: agent.clone(),
                message: message.to_owned(),
            };
            reports.push(self.dispatch(command).await);
        }
        reports
    }

    /// Subscribes the agent's tokens to the team topic on every channel.
    pub async fn subscribe(&self, agent: &AgentId, team: &TeamId) -> DispatchReport {
        self.dispatch(Command::SubscribeToTeam {
            agent: agent.clone(),
            team: team.clone(),
        })
        .await
    }

    /// Unsubscribes the agent's tokens from the team topic on every channel.
    pub async fn unsubscribe(&self, agent: &AgentId, team: &TeamId) -> DispatchReport {
        self.dispatch(Command::UnsubscribeFromTeam {
            agent: agent.clone(),
            team: team.clone(),
        })
        .await
    }

    /// Subscribes every current member of a team to its topic.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Identity`] when the membership lookup fails.
    pub async fn resubscribe_team(&self, team: &TeamId) -> DispatchResult<Vec<DispatchReport>> {
        let members = self.identity.team_members(team).await?;
        let mut reports = Vec::with_capacity(members.len());
        for member in &members {
            reports.push(self.subscribe(member, team).await);
        }
        info!(team = %team, members = members.len(), "team resubscribed");
        Ok(reports)
    }

    async fn prune(&self, agent: &AgentId, report: &DispatchReport) {
        for (channel, token) in report.invalid_tokens() {
            match self
                .identity
                .remove_token(agent, &channel, token.expose())
                .await
            {
                Ok(removed) => info!(
                    channel = %channel,
                    agent = %agent,
                    token = %token.fingerprint(),
                    removed,
                    "pruned invalid token"
                ),
                Err(err) => warn!(
                    channel = %channel,
                    agent = %agent,
                    token = %token.fingerprint(),
                    error = %err,
                    "failed to prune invalid token"
                ),
            }
        }
    }
}
