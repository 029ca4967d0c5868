use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DescriptorError;

/// Phase discriminator carried in the inbound `source` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestSource {
    /// Batch of warehouse calls to validate and enqueue.
    Enqueue,
    /// One queued message to execute against the external API.
    Execution,
}

impl RequestSource {
    /// Returns the stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueue => "ENQUEUE",
            Self::Execution => "EXECUTION",
        }
    }

    /// Resolves the raw `source` field; absent, null or empty selects the enqueue phase.
    pub fn from_discriminator(value: Option<&Value>) -> Result<Self, DescriptorError> {
        match value {
            None | Some(Value::Null) => Ok(Self::Enqueue),
            Some(Value::String(value)) if value.is_empty() => Ok(Self::Enqueue),
            Some(Value::String(value)) => Self::from_str(value),
            Some(other) => Err(DescriptorError::UnsupportedSource(other.to_string())),
        }
    }
}

impl FromStr for RequestSource {
    type Err = DescriptorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ENQUEUE" => Ok(Self::Enqueue),
            "EXECUTION" => Ok(Self::Execution),
            other => Err(DescriptorError::UnsupportedSource(other.to_owned())),
        }
    }
}
