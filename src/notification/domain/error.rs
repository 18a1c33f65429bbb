//! Domain errors for notification envelopes.

use super::CommandCode;
use crate::identity::domain::IdentityDomainError;
use crate::task::domain::TaskDomainError;
use thiserror::Error;

/// Validation errors raised while building or decoding envelopes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationDomainError {
    /// The command code is not part of the closed command set.
    #[error("unknown command code: {0}")]
    UnknownCommand(String),

    /// The command needs a target the envelope does not carry.
    #[error("{command} requires a {target} target")]
    MissingTarget {
        /// Command being decoded.
        command: CommandCode,
        /// Missing target kind (`agent` or `team`).
        target: &'static str,
    },

    /// The envelope carries a target the command does not accept.
    #[error("{command} does not accept a {target} target")]
    UnexpectedTarget {
        /// Command being decoded.
        command: CommandCode,
        /// Rejected target kind (`agent` or `team`).
        target: &'static str,
    },

    /// A per-command payload field is missing.
    #[error("{command} requires the `{field}` field")]
    MissingField {
        /// Command being decoded.
        command: CommandCode,
        /// Missing data key.
        field: &'static str,
    },

    /// An agent or team identifier failed validation.
    #[error(transparent)]
    Identity(#[from] IdentityDomainError),

    /// An operation or task identifier failed validation.
    #[error(transparent)]
    Task(#[from] TaskDomainError),
}
