use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DescriptorError;
use crate::json_text::{present, present_str};

/// Authentication strategy names accepted in `auth.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    /// OAuth 2.0 client-credentials token exchange.
    ClientCredentials,
    /// HTTP Basic credentials read from the secret.
    HttpBasic,
}

impl AuthType {
    /// Returns the stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "CLIENT_CREDENTIALS",
            Self::HttpBasic => "HTTP_BASIC",
        }
    }
}

impl FromStr for AuthType {
    type Err = DescriptorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CLIENT_CREDENTIALS" => Ok(Self::ClientCredentials),
            "HTTP_BASIC" => Ok(Self::HttpBasic),
            other => Err(DescriptorError::UnsupportedAuthType(other.to_owned())),
        }
    }
}

/// The `auth` block of a call descriptor, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDescriptor {
    secret_name: Option<String>,
    auth_type: Option<String>,
    auth_server: Option<String>,
    client_id: Option<String>,
}

impl AuthDescriptor {
    /// Reads an auth block, returning `None` when no auth is configured.
    ///
    /// A non-object value is kept as a descriptor without properties so the
    /// missing secret name surfaces on resolution.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(fields) if fields.is_empty() => None,
            Value::Object(fields) => Some(Self::from_object(fields)),
            Value::Null => None,
            Value::String(raw) if raw.trim().is_empty() => None,
            _ => Some(Self::from_object(&Map::new())),
        }
    }

    fn from_object(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| present_str(fields, key).map(str::to_owned);

        Self {
            secret_name: text("secret_name"),
            auth_type: text("type"),
            auth_server: text("auth_server"),
            client_id: text("client_id"),
        }
    }

    /// Returns the secret identifier, which every strategy requires.
    pub fn secret_name(&self) -> Result<&str, DescriptorError> {
        self.secret_name
            .as_deref()
            .ok_or_else(|| DescriptorError::missing("secret_name"))
    }

    /// Returns the raw `type` value, or an empty string when absent.
    #[must_use]
    pub fn auth_type_label(&self) -> &str {
        self.auth_type.as_deref().unwrap_or_default()
    }

    /// Selects the strategy named by `type` and checks its own required fields.
    pub fn strategy(&self) -> Result<AuthStrategy, DescriptorError> {
        match AuthType::from_str(self.auth_type_label())? {
            AuthType::ClientCredentials => Ok(AuthStrategy::ClientCredentials {
                auth_server: self
                    .auth_server
                    .clone()
                    .ok_or_else(|| DescriptorError::missing("auth_server"))?,
                client_id: self
                    .client_id
                    .clone()
                    .ok_or_else(|| DescriptorError::missing("client_id"))?,
            }),
            AuthType::HttpBasic => Ok(AuthStrategy::HttpBasic),
        }
    }
}

/// A selected authentication strategy with its non-secret parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Exchange `(client_id, client_secret)` for an access token at `auth_server`.
    ClientCredentials {
        /// Token endpoint URL.
        auth_server: String,
        /// OAuth client identifier.
        client_id: String,
    },
    /// Use `username`/`password` from the secret as basic credentials.
    HttpBasic,
}

impl AuthStrategy {
    /// Returns the strategy type.
    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::ClientCredentials { .. } => AuthType::ClientCredentials,
            Self::HttpBasic => AuthType::HttpBasic,
        }
    }
}

/// Credential material resolved from the secret store for one execution.
#[derive(Clone)]
pub struct SecretBundle(Map<String, Value>);

impl SecretBundle {
    /// Wraps a resolved secret payload, which must be a JSON object.
    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(DescriptorError::MalformedSecret),
        }
    }

    /// Returns a required string property of the secret.
    pub fn require_str(&self, key: &str) -> Result<&str, DescriptorError> {
        present(&self.0, key)
            .and_then(Value::as_str)
            .ok_or_else(|| DescriptorError::missing(key))
    }
}

impl Debug for SecretBundle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("SecretBundle(<redacted>)")
    }
}

/// Credential attached to the outbound call. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// No auth block was configured.
    Anonymous,
    /// Access token sent as `Authorization: <scheme> <token>`.
    AccessToken {
        /// Authorization scheme prefix.
        scheme: String,
        /// Token issued by the token endpoint.
        token: String,
    },
    /// Transport-level basic credentials.
    Basic {
        /// Basic auth user.
        username: String,
        /// Basic auth password.
        password: String,
    },
}

impl Credential {
    /// Returns the `Authorization` header value for token credentials.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            Self::AccessToken { scheme, token } => Some(format!("{scheme} {token}")),
            Self::Anonymous | Self::Basic { .. } => None,
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => formatter.write_str("Anonymous"),
            Self::AccessToken { scheme, .. } => formatter
                .debug_struct("AccessToken")
                .field("scheme", scheme)
                .field("token", &"<redacted>")
                .finish(),
            Self::Basic { username, .. } => formatter
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}
