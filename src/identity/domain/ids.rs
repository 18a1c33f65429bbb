//! Opaque agent and team identifiers.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length, in characters, of an agent or team identifier.
pub const MAX_IDENTITY_ID_LENGTH: usize = 64;

/// Opaque identifier for a participating agent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an agent identifier from a trimmed, non-empty value of at most
    /// 64 characters.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyAgentId`] when the value is empty
    /// after trimming, or [`IdentityDomainError::AgentIdTooLong`] when it exceeds
    /// [`MAX_IDENTITY_ID_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::EmptyAgentId);
        }
        if trimmed.chars().count() > MAX_IDENTITY_ID_LENGTH {
            return Err(IdentityDomainError::AgentIdTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier for a broadcast team.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    /// Creates a team identifier from a trimmed, non-empty value of at most
    /// 64 characters.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyTeamId`] when the value is empty
    /// after trimming, or [`IdentityDomainError::TeamIdTooLong`] when it exceeds
    /// [`MAX_IDENTITY_ID_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::EmptyTeamId);
        }
        if trimmed.chars().count() > MAX_IDENTITY_ID_LENGTH {
            return Err(IdentityDomainError::TeamIdTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TeamId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
