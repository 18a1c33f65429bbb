//! Envelope: one dispatch unit handed to the notification bus.

use super::{Command, CommandCode};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a dispatched envelope, used to correlate log lines
/// across adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeId(Uuid);

impl EnvelopeId {
    /// Generates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EnvelopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel-agnostic notification: a command plus identity and issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    id: EnvelopeId,
    issued_at: DateTime<Utc>,
    command: Command,
}

impl Envelope {
    /// Wraps a command, stamping it with a fresh id and the clock's time.
    #[must_use]
    pub fn new(command: Command, clock: &(impl Clock + ?Sized)) -> Self {
        Self {
            id: EnvelopeId::new(),
            issued_at: clock.utc(),
            command,
        }
    }

    /// Returns the envelope identifier.
    #[must_use]
    pub const fn id(&self) -> EnvelopeId {
        self.id
    }

    /// Returns when the envelope was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the carried command.
    #[must_use]
    pub const fn command(&self) -> &Command {
        &self.command
    }

    /// Returns the command code.
    #[must_use]
    pub const fn code(&self) -> CommandCode {
        self.command.code()
    }
}
