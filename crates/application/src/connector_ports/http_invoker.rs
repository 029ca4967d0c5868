use std::time::Duration;

use apiconnector_core::AppResult;
use apiconnector_domain::{Credential, HttpMethod, OutboundBody};
use async_trait::async_trait;

/// One authenticated external call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Target URI.
    pub uri: String,
    /// Outbound headers.
    pub headers: Vec<(String, String)>,
    /// Wire-format query string appended to the URI.
    pub query_string: String,
    /// Request body.
    pub body: OutboundBody,
    /// Hard upper bound for the call.
    pub timeout: Duration,
    /// Credential to attach.
    pub credential: Credential,
}

/// External API reply.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body text.
    pub body: String,
    /// Time between sending and reading the full body.
    pub elapsed: Duration,
}

impl InvokedResponse {
    /// Returns whether the status is in the 2xx class.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    /// Returns whether the body is declared as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|value| value.to_ascii_lowercase().starts_with("application/json"))
    }

    /// Returns the headers as a JSON object string.
    #[must_use]
    pub fn headers_json(&self) -> String {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();
        serde_json::Value::Object(headers).to_string()
    }
}

/// Port for performing the external HTTP call.
#[async_trait]
pub trait HttpInvoker: Send + Sync {
    /// Sends one request; any completed response is `Ok`, transport failures are errors.
    async fn invoke(&self, request: OutboundRequest) -> AppResult<InvokedResponse>;
}
