//! Domain model for agent and team identity.

mod channel;
mod error;
mod ids;

pub use channel::{ChannelName, DeliveryToken, Topic};
pub use error::IdentityDomainError;
pub use ids::{AgentId, MAX_IDENTITY_ID_LENGTH, TeamId};
