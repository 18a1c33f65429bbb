//! Error types for identity domain validation.

use thiserror::Error;

/// Errors returned while constructing identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The agent identifier is empty after trimming.
    #[error("agent identifier must not be empty")]
    EmptyAgentId,

    /// The agent identifier exceeds the 64-character limit.
    #[error("agent identifier exceeds 64 character limit: {0}")]
    AgentIdTooLong(String),

    /// The team identifier is empty after trimming.
    #[error("team identifier must not be empty")]
    EmptyTeamId,

    /// The team identifier exceeds the 64-character limit.
    #[error("team identifier exceeds 64 character limit: {0}")]
    TeamIdTooLong(String),

    /// The channel name is empty after trimming.
    #[error("channel name must not be empty")]
    EmptyChannelName,

    /// The channel name contains characters outside `[a-z0-9_-]`.
    #[error(
        "channel name '{0}' contains invalid characters (only lowercase alphanumeric, '-' and '_' allowed)"
    )]
    InvalidChannelName(String),

    /// The channel name exceeds the 64-character limit.
    #[error("channel name exceeds 64 character limit: {0}")]
    ChannelNameTooLong(String),

    /// The delivery token is blank.
    #[error("delivery token must not be blank")]
    BlankToken,
}
