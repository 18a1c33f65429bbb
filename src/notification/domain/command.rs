//! Closed command set carried by notification envelopes.

use crate::identity::domain::{AgentId, TeamId};
use crate::task::domain::{OperationId, TaskRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable command codes understood by every channel adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCode {
    /// Free-text message to one agent.
    GenericMessage,
    /// An agent reported a new location.
    AgentLocationChange,
    /// A marker changed state.
    MarkerStatusChange,
    /// An agent was assigned a marker.
    MarkerAssignmentChange,
    /// An operation's map changed.
    MapChange,
    /// A link changed state.
    LinkStatusChange,
    /// An agent was assigned a link.
    LinkAssignmentChange,
    /// An agent logged in.
    AgentLogin,
    /// Add an agent's tokens to a team topic.
    SubscribeToTeam,
    /// Remove an agent's tokens from a team topic.
    UnsubscribeFromTeam,
}

impl CommandCode {
    /// Every command code, in wire order.
    pub const ALL: [Self; 10] = [
        Self::GenericMessage,
        Self::AgentLocationChange,
        Self::MarkerStatusChange,
        Self::MarkerAssignmentChange,
        Self::MapChange,
        Self::LinkStatusChange,
        Self::LinkAssignmentChange,
        Self::AgentLogin,
        Self::SubscribeToTeam,
        Self::UnsubscribeFromTeam,
    ];

    /// Returns the wire value of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenericMessage => "generic_message",
            Self::AgentLocationChange => "agent_location_change",
            Self::MarkerStatusChange => "marker_status_change",
            Self::MarkerAssignmentChange => "marker_assignment_change",
            Self::MapChange => "map_change",
            Self::LinkStatusChange => "link_status_change",
            Self::LinkAssignmentChange => "link_assignment_change",
            Self::AgentLogin => "agent_login",
            Self::SubscribeToTeam => "subscribe_to_team",
            Self::UnsubscribeFromTeam => "unsubscribe_from_team",
        }
    }
}

impl TryFrom<&str> for CommandCode {
    type Error = ParseCommandCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| ParseCommandCodeError(value.to_owned()))
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown command code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown command code: {0}")]
pub struct ParseCommandCodeError(pub String);

/// Direction of a topic membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    /// Add tokens to the topic.
    Subscribe,
    /// Remove tokens from the topic.
    Unsubscribe,
}

/// How an envelope reaches its recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing<'a> {
    /// Every token of one agent.
    Direct(&'a AgentId),
    /// A team's broadcast topic.
    Topic(&'a TeamId),
    /// Topic membership management for one agent's tokens.
    Membership {
        /// Agent whose tokens change membership.
        agent: &'a AgentId,
        /// Team whose topic is affected.
        team: &'a TeamId,
        /// Subscribe or unsubscribe.
        action: MembershipAction,
    },
}

/// A notification command with exactly the fields it needs.
///
/// Personal commands carry an agent target; collective commands carry a team
/// target. The target kind is fixed by the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free-text message to one agent.
    GenericMessage {
        /// Recipient.
        agent: AgentId,
        /// Message text.
        message: String,
    },
    /// Broadcast that an agent moved.
    AgentLocationChange {
        /// Audience.
        team: TeamId,
        /// Agent that moved.
        agent: AgentId,
        /// Note from the agent, often empty.
        message: String,
    },
    /// Broadcast that a marker changed state.
    MarkerStatusChange {
        /// Audience.
        team: TeamId,
        /// Marker that changed.
        marker: TaskRef,
        /// New state or other note.
        message: String,
    },
    /// Tell an agent they hold a marker.
    MarkerAssignmentChange {
        /// Recipient.
        agent: AgentId,
        /// Assigned marker.
        marker: TaskRef,
        /// Note for the agent.
        message: String,
    },
    /// Broadcast that an operation's map changed.
    MapChange {
        /// Audience.
        team: TeamId,
        /// Changed operation.
        operation: OperationId,
        /// Note describing the change.
        message: String,
    },
    /// Broadcast that a link changed state.
    LinkStatusChange {
        /// Audience.
        team: TeamId,
        /// Link that changed.
        link: TaskRef,
        /// New state or other note.
        message: String,
    },
    /// Tell an agent they hold a link.
    LinkAssignmentChange {
        /// Recipient.
        agent: AgentId,
        /// Assigned link.
        link: TaskRef,
        /// Note for the agent.
        message: String,
    },
    /// Broadcast that an agent logged in.
    AgentLogin {
        /// Audience.
        team: TeamId,
        /// Agent that logged in.
        agent: AgentId,
        /// Note from the agent, often empty.
        message: String,
    },
    /// Subscribe an agent's tokens to a team topic.
    SubscribeToTeam {
        /// Agent whose tokens join.
        agent: AgentId,
        /// Team to join.
        team: TeamId,
    },
    /// Unsubscribe an agent's tokens from a team topic.
    UnsubscribeFromTeam {
        /// Agent whose tokens leave.
        agent: AgentId,
        /// Team to leave.
        team: TeamId,
    },
}

impl Command {
    /// Returns the wire code of the command.
    #[must_use]
    pub const fn code(&self) -> CommandCode {
        match self {
            Self::GenericMessage { .. } => CommandCode::GenericMessage,
            Self::AgentLocationChange { .. } => CommandCode::AgentLocationChange,
            Self::MarkerStatusChange { .. } => CommandCode::MarkerStatusChange,
            Self::MarkerAssignmentChange { .. } => CommandCode::MarkerAssignmentChange,
            Self::MapChange { .. } => CommandCode::MapChange,
            Self::LinkStatusChange { .. } => CommandCode::LinkStatusChange,
            Self::LinkAssignmentChange { .. } => CommandCode::LinkAssignmentChange,
            Self::AgentLogin { .. } => CommandCode::AgentLogin,
            Self::SubscribeToTeam { .. } => CommandCode::SubscribeToTeam,
            Self::UnsubscribeFromTeam { .. } => CommandCode::UnsubscribeFromTeam,
        }
    }

    /// Returns how the command is addressed.
    #[must_use]
    pub const fn addressing(&self) -> Addressing<'_> {
        match self {
            Self::GenericMessage { agent, .. }
            | Self::MarkerAssignmentChange { agent, .. }
            | Self::LinkAssignmentChange { agent, .. } => Addressing::Direct(agent),
            Self::AgentLocationChange { team, .. }
            | Self::MarkerStatusChange { team, .. }
            | Self::MapChange { team, .. }
            | Self::LinkStatusChange { team, .. }
            | Self::AgentLogin { team, .. } => Addressing::Topic(team),
            Self::SubscribeToTeam { agent, team } => Addressing::Membership {
                agent,
                team,
                action: MembershipAction::Subscribe,
            },
            Self::UnsubscribeFromTeam { agent, team } => Addressing::Membership {
                agent,
                team,
                action: MembershipAction::Unsubscribe,
            },
        }
    }

    /// Returns the agent whose tokens the command is delivered to, if any.
    #[must_use]
    pub const fn recipient(&self) -> Option<&AgentId> {
        match self.addressing() {
            Addressing::Direct(agent) | Addressing::Membership { agent, .. } => Some(agent),
            Addressing::Topic(_) => None,
        }
    }
}
