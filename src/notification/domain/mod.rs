//! Domain model for notification dispatch.

mod command;
mod envelope;
mod error;
mod wire;

pub use command::{Addressing, Command, CommandCode, MembershipAction, ParseCommandCodeError};
pub use envelope::{Envelope, EnvelopeId};
pub use error::NotificationDomainError;
pub use wire::{WireEnvelope, data_keys};
