//! Runtime configuration.
//!
//! Configuration is a JSON document; every field has a default so an empty
//! object is a valid configuration.

use crate::identity::domain::{ChannelName, IdentityDomainError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid configuration JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configured channel name is invalid.
    #[error(transparent)]
    ChannelName(#[from] IdentityDomainError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOpsConfig {
    /// Dispatch settings.
    pub notification: NotificationConfig,
    /// Push channel settings.
    pub push: PushConfig,
}

/// Dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationConfig {
    /// Upper bound for one adapter send, in milliseconds.
    pub send_timeout_ms: u64,
    /// Remove tokens that channels report as permanently invalid.
    pub prune_invalid_tokens: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 5_000,
            prune_invalid_tokens: true,
        }
    }
}

impl NotificationConfig {
    /// Returns the send timeout as a duration.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Push channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushConfig {
    /// Registry name of the push channel.
    pub channel_name: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            channel_name: "push".to_owned(),
        }
    }
}

impl PushConfig {
    /// Returns the validated channel name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChannelName`] when the name is invalid.
    pub fn channel_name(&self) -> Result<ChannelName, ConfigError> {
        Ok(ChannelName::new(self.channel_name.as_str())?)
    }
}

impl FieldOpsConfig {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys,
    /// and [`ConfigError::ChannelName`] for an invalid push channel name.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.push.channel_name()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json_str(&document)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_document_uses_defaults() {
        let config = FieldOpsConfig::from_json_str("{}").expect("defaults should parse");

        assert_eq!(config, FieldOpsConfig::default());
        assert_eq!(config.notification.send_timeout(), Duration::from_secs(5));
        assert!(config.notification.prune_invalid_tokens);
        assert_eq!(
            config.push.channel_name().expect("default name").as_str(),
            "push"
        );
    }

    #[rstest]
    fn partial_sections_keep_remaining_defaults() {
        let config = FieldOpsConfig::from_json_str(
            r#"{"notification": {"send_timeout_ms": 250}, "push": {"channel_name": "fcm"}}"#,
        )
        .expect("partial config should parse");

        assert_eq!(config.notification.send_timeout_ms, 250);
        assert!(config.notification.prune_invalid_tokens);
        assert_eq!(config.push.channel_name, "fcm");
    }

    #[rstest]
    #[case(r#"{"notification": {"retries": 3}}"#)]
    #[case("not json")]
    fn malformed_documents_are_rejected(#[case] document: &str) {
        let result = FieldOpsConfig::from_json_str(document);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[rstest]
    fn invalid_channel_name_is_rejected() {
        let result = FieldOpsConfig::from_json_str(r#"{"push": {"channel_name": "Push Bus"}}"#);

        assert!(matches!(result, Err(ConfigError::ChannelName(_))));
    }
}
