//! Channel-scoped addressing values: channel names, tokens and topics.

use super::{IdentityDomainError, TeamId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Maximum length for a channel name.
const MAX_CHANNEL_NAME_LENGTH: usize = 64;

/// Number of digest bytes kept in a token fingerprint (12 hex characters).
const FINGERPRINT_BYTES: usize = 6;

/// Validated name of a notification channel (e.g. `push`, `telegram`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    /// Creates a validated channel name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_-]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyChannelName`] when the value is
    /// empty after trimming, [`IdentityDomainError::ChannelNameTooLong`] when
    /// it exceeds 64 characters, or
    /// [`IdentityDomainError::InvalidChannelName`] for other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyChannelName);
        }

        if normalized.len() > MAX_CHANNEL_NAME_LENGTH {
            return Err(IdentityDomainError::ChannelNameTooLong(raw));
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !is_valid {
            return Err(IdentityDomainError::InvalidChannelName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the channel name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Medium-specific delivery address for one agent on one channel.
///
/// `Debug` and `Display` print the fingerprint rather than the raw token so
/// tokens do not leak into logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryToken(String);

impl DeliveryToken {
    /// Creates a delivery token.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::BlankToken`] when the value is empty or
    /// whitespace only.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(IdentityDomainError::BlankToken);
        }
        Ok(Self(raw))
    }

    /// Returns the raw token value for handing to a transport.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns a short SHA-256 fingerprint suitable for logging.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        Sha256::digest(self.0.as_bytes())
            .iter()
            .take(FINGERPRINT_BYTES)
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

impl fmt::Debug for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeliveryToken")
            .field(&self.fingerprint())
            .finish()
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token:{}", self.fingerprint())
    }
}

/// Broadcast address representing a team on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Returns the topic for a team; the topic name is the team id verbatim.
    #[must_use]
    pub fn for_team(team: &TeamId) -> Self {
        Self(team.as_str().to_owned())
    }

    /// Returns the topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
