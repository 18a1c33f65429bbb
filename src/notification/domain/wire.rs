//! Flat string-map encoding used by channel transports and inbound
//! importers.

use super::{Command, CommandCode, NotificationDomainError};
use crate::identity::domain::{AgentId, TeamId};
use crate::task::domain::{OperationId, TaskId, TaskRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys of the wire data map.
pub mod data_keys {
    /// Command code.
    pub const CMD: &str = "cmd";
    /// Free-text message.
    pub const MSG: &str = "msg";
    /// Operation identifier.
    pub const OPERATION: &str = "opID";
    /// Marker identifier.
    pub const MARKER: &str = "markerID";
    /// Link identifier.
    pub const LINK: &str = "linkID";
    /// Subject agent identifier.
    pub const AGENT: &str = "gid";
}

/// An envelope in transit: the data map plus the raw addressing targets.
///
/// Exactly one target is set for personal and collective commands; topic
/// membership commands set both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Agent target, for personal and membership commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Team target, for collective and membership commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Wire data map.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Command {
    /// Encodes the payload as the flat data map adapters put on the wire.
    ///
    /// `cmd` and `msg` are always present; the remaining keys depend on the
    /// command.
    #[must_use]
    pub fn data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert(data_keys::CMD.to_owned(), self.code().as_str().to_owned());
        let message = match self {
            Self::GenericMessage { message, .. } => message.clone(),
            Self::AgentLocationChange { agent, message, .. }
            | Self::AgentLogin { agent, message, .. } => {
                data.insert(data_keys::AGENT.to_owned(), agent.as_str().to_owned());
                message.clone()
            }
            Self::MarkerStatusChange {
                marker, message, ..
            }
            | Self::MarkerAssignmentChange {
                marker, message, ..
            } => {
                insert_task(&mut data, data_keys::MARKER, marker);
                message.clone()
            }
            Self::LinkStatusChange { link, message, .. }
            | Self::LinkAssignmentChange { link, message, .. } => {
                insert_task(&mut data, data_keys::LINK, link);
                message.clone()
            }
            Self::MapChange {
                operation, message, ..
            } => {
                data.insert(data_keys::OPERATION.to_owned(), operation.as_str().to_owned());
                message.clone()
            }
            Self::SubscribeToTeam { .. } => "subscribe".to_owned(),
            Self::UnsubscribeFromTeam { .. } => "unsubscribe".to_owned(),
        };
        data.insert(data_keys::MSG.to_owned(), message);
        data
    }

    /// Encodes the command with its targets.
    #[must_use]
    pub fn to_wire(&self) -> WireEnvelope {
        let (agent, team) = match self.addressing() {
            super::Addressing::Direct(agent) => (Some(agent.to_string()), None),
            super::Addressing::Topic(team) => (None, Some(team.to_string())),
            super::Addressing::Membership { agent, team, .. } => {
                (Some(agent.to_string()), Some(team.to_string()))
            }
        };
        WireEnvelope {
            agent,
            team,
            data: self.data(),
        }
    }
}

fn insert_task(data: &mut BTreeMap<String, String>, key: &str, task: &TaskRef) {
    data.insert(
        data_keys::OPERATION.to_owned(),
        task.operation().as_str().to_owned(),
    );
    data.insert(key.to_owned(), task.task().as_str().to_owned());
}

impl WireEnvelope {
    /// Decodes and validates the command carried by this envelope.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError`] for an unknown command code, a
    /// missing or extra target, a missing per-command field, or an invalid
    /// identifier.
    pub fn into_command(self) -> Result<Command, NotificationDomainError> {
        let raw_code = self
            .data
            .get(data_keys::CMD)
            .ok_or_else(|| NotificationDomainError::UnknownCommand(String::new()))?;
        let code = CommandCode::try_from(raw_code.as_str())
            .map_err(|err| NotificationDomainError::UnknownCommand(err.0))?;
        let decoder = Decoder { code, wire: &self };
        decoder.decode()
    }
}

struct Decoder<'a> {
    code: CommandCode,
    wire: &'a WireEnvelope,
}

impl Decoder<'_> {
    fn decode(&self) -> Result<Command, NotificationDomainError> {
        let command = match self.code {
            CommandCode::GenericMessage => Command::GenericMessage {
                agent: self.direct_target()?,
                message: self.message(),
            },
            CommandCode::AgentLocationChange => Command::AgentLocationChange {
                team: self.topic_target()?,
                agent: AgentId::new(self.field(data_keys::AGENT)?)?,
                message: self.message(),
            },
            CommandCode::MarkerStatusChange => Command::MarkerStatusChange {
                team: self.topic_target()?,
                marker: self.task(data_keys::MARKER)?,
                message: self.message(),
            },
            CommandCode::MarkerAssignmentChange => Command::MarkerAssignmentChange {
                agent: self.direct_target()?,
                marker: self.task(data_keys::MARKER)?,
                message: self.message(),
            },
            CommandCode::MapChange => Command::MapChange {
                team: self.topic_target()?,
                operation: OperationId::new(self.field(data_keys::OPERATION)?)?,
                message: self.message(),
            },
            CommandCode::LinkStatusChange => Command::LinkStatusChange {
                team: self.topic_target()?,
                link: self.task(data_keys::LINK)?,
                message: self.message(),
            },
            CommandCode::LinkAssignmentChange => Command::LinkAssignmentChange {
                agent: self.direct_target()?,
                link: self.task(data_keys::LINK)?,
                message: self.message(),
            },
            CommandCode::AgentLogin => Command::AgentLogin {
                team: self.topic_target()?,
                agent: AgentId::new(self.field(data_keys::AGENT)?)?,
                message: self.message(),
            },
            CommandCode::SubscribeToTeam => Command::SubscribeToTeam {
                agent: self.agent()?,
                team: self.team()?,
            },
            CommandCode::UnsubscribeFromTeam => Command::UnsubscribeFromTeam {
                agent: self.agent()?,
                team: self.team()?,
            },
        };
        Ok(command)
    }

    fn direct_target(&self) -> Result<AgentId, NotificationDomainError> {
        if self.wire.team.is_some() {
            return Err(NotificationDomainError::UnexpectedTarget {
                command: self.code,
                target: "team",
            });
        }
        self.agent()
    }

    fn topic_target(&self) -> Result<TeamId, NotificationDomainError> {
        if self.wire.agent.is_some() {
            return Err(NotificationDomainError::UnexpectedTarget {
                command: self.code,
                target: "agent",
            });
        }
        self.team()
    }

    fn agent(&self) -> Result<AgentId, NotificationDomainError> {
        let raw = self
            .wire
            .agent
            .as_deref()
            .ok_or(NotificationDomainError::MissingTarget {
                command: self.code,
                target: "agent",
            })?;
        Ok(AgentId::new(raw)?)
    }

    fn team(&self) -> Result<TeamId, NotificationDomainError> {
        let raw = self
            .wire
            .team
            .as_deref()
            .ok_or(NotificationDomainError::MissingTarget {
                command: self.code,
                target: "team",
            })?;
        Ok(TeamId::new(raw)?)
    }

    fn field(&self, key: &'static str) -> Result<&str, NotificationDomainError> {
        self.wire
            .data
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or(NotificationDomainError::MissingField {
                command: self.code,
                field: key,
            })
    }

    fn task(&self, key: &'static str) -> Result<TaskRef, NotificationDomainError> {
        let operation = OperationId::new(self.field(data_keys::OPERATION)?)?;
        let task = TaskId::new(self.field(key)?)?;
        Ok(TaskRef::new(operation, task))
    }

    fn message(&self) -> String {
        self.wire
            .data
            .get(data_keys::MSG)
            .cloned()
            .unwrap_or_default()
    }
}
