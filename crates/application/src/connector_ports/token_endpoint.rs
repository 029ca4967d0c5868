use apiconnector_core::AppResult;
use async_trait::async_trait;

/// Client-credentials grant request.
#[derive(Clone)]
pub struct TokenRequest {
    /// Token endpoint URL.
    pub auth_server: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenRequest")
            .field("auth_server", &self.auth_server)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Raw token endpoint reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// HTTP status returned by the token endpoint.
    pub status_code: u16,
    /// Response body text.
    pub body: String,
}

/// Port for OAuth 2.0 token exchange.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// POSTs `grant_type=client_credentials` with basic client authentication.
    ///
    /// Non-success statuses are returned as responses; only transport failures are errors.
    async fn request_client_credentials_token(
        &self,
        request: &TokenRequest,
    ) -> AppResult<TokenResponse>;
}
