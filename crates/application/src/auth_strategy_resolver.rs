use std::sync::Arc;

use apiconnector_domain::{AuthStrategy, Credential, DescriptorError, SecretBundle};
use http::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use crate::connector_ports::{TokenEndpoint, TokenRequest};

/// Why credentials could not be produced for a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The auth block or secret lacks something the strategy needs.
    Descriptor(DescriptorError),
    /// The token endpoint answered with a non-200 status.
    TokenRejected {
        /// Body returned by the token endpoint.
        body: String,
    },
    /// The token endpoint could not be reached or returned no usable token.
    TokenUnavailable(String),
}

impl AuthFailure {
    /// Returns the status reported for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Descriptor(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TokenRejected { .. } | Self::TokenUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the failure text reported to the caller and telemetry.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Descriptor(error) => error.to_string(),
            Self::TokenRejected { body } => {
                format!("Failed to obtain token from the OAuth 2.0 server: {body}")
            }
            Self::TokenUnavailable(detail) => {
                format!("Failed to obtain token from the OAuth 2.0 server: {detail}")
            }
        }
    }
}

impl From<DescriptorError> for AuthFailure {
    fn from(value: DescriptorError) -> Self {
        Self::Descriptor(value)
    }
}

/// Turns an auth strategy plus its secret into a request credential.
#[derive(Clone)]
pub struct AuthStrategyResolver {
    token_endpoint: Arc<dyn TokenEndpoint>,
    token_scheme: String,
}

impl AuthStrategyResolver {
    /// Creates a resolver; `token_scheme` prefixes issued access tokens.
    #[must_use]
    pub fn new(token_endpoint: Arc<dyn TokenEndpoint>, token_scheme: impl Into<String>) -> Self {
        Self {
            token_endpoint,
            token_scheme: token_scheme.into(),
        }
    }

    /// Produces the credential for one call.
    pub async fn resolve(
        &self,
        strategy: &AuthStrategy,
        secret: &SecretBundle,
    ) -> Result<Credential, AuthFailure> {
        match strategy {
            AuthStrategy::ClientCredentials {
                auth_server,
                client_id,
            } => {
                let request = TokenRequest {
                    auth_server: auth_server.clone(),
                    client_id: client_id.clone(),
                    client_secret: secret.require_str("client_secret")?.to_owned(),
                };
                let token = self.exchange_token(&request).await?;

                Ok(Credential::AccessToken {
                    scheme: self.token_scheme.clone(),
                    token,
                })
            }
            AuthStrategy::HttpBasic => Ok(Credential::Basic {
                username: secret.require_str("username")?.to_owned(),
                password: secret.require_str("password")?.to_owned(),
            }),
        }
    }

    async fn exchange_token(&self, request: &TokenRequest) -> Result<String, AuthFailure> {
        debug!(auth_server = %request.auth_server, "requesting credentials from server");

        let response = self
            .token_endpoint
            .request_client_credentials_token(request)
            .await
            .map_err(|failure| AuthFailure::TokenUnavailable(failure.to_string()))?;

        if response.status_code != 200 {
            error!(
                auth_server = %request.auth_server,
                status_code = response.status_code,
                "token endpoint rejected client credentials"
            );
            return Err(AuthFailure::TokenRejected {
                body: response.body,
            });
        }

        let payload: Value = serde_json::from_str(response.body.as_str()).map_err(|error| {
            AuthFailure::TokenUnavailable(format!("token response is not JSON: {error}"))
        })?;

        payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AuthFailure::Descriptor(DescriptorError::missing("access_token")))
    }
}
