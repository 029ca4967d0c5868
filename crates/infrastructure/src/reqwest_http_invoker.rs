//! reqwest-backed external call and token exchange.

use std::time::Instant;

use apiconnector_application::{
    HttpInvoker, InvokedResponse, OutboundRequest, TokenEndpoint, TokenRequest, TokenResponse,
};
use apiconnector_core::{AppError, AppResult};
use apiconnector_domain::{Credential, HttpMethod, OutboundBody};
use async_trait::async_trait;
use tracing::debug;

/// HTTP adapter for both the target call and the OAuth 2.0 token exchange.
#[derive(Clone)]
pub struct ReqwestHttpInvoker {
    http_client: reqwest::Client,
    token_client: reqwest::Client,
}

impl ReqwestHttpInvoker {
    /// Creates an invoker from prebuilt clients.
    ///
    /// `token_client` should not follow redirects.
    #[must_use]
    pub fn new(http_client: reqwest::Client, token_client: reqwest::Client) -> Self {
        Self {
            http_client,
            token_client,
        }
    }

    /// Builds both clients with a shared user agent.
    pub fn build(user_agent: &str) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;
        let token_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build token client: {error}"))
            })?;

        Ok(Self::new(http_client, token_client))
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn target_url(uri: &str, query_string: &str) -> String {
    if query_string.is_empty() {
        return uri.to_owned();
    }

    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{query_string}")
}

fn response_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

#[async_trait]
impl HttpInvoker for ReqwestHttpInvoker {
    async fn invoke(&self, request: OutboundRequest) -> AppResult<InvokedResponse> {
        let url = target_url(request.uri.as_str(), request.query_string.as_str());
        debug!(method = request.method.as_str(), url = %url, "calling external api");

        let mut builder = self
            .http_client
            .request(reqwest_method(request.method), url.as_str())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.credential {
            Credential::Anonymous => builder,
            Credential::AccessToken { .. } => match request.credential.authorization_header() {
                Some(header) => builder.header(reqwest::header::AUTHORIZATION, header),
                None => builder,
            },
            Credential::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        };

        builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Text(text) | OutboundBody::Form(text) => builder.body(text),
            OutboundBody::Json(document) => builder.json(&document),
        };

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("external call failed: {error}")))?;
        let status_code = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.text().await.map_err(|error| {
            AppError::Internal(format!("failed to read external response body: {error}"))
        })?;

        Ok(InvokedResponse {
            status_code,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }
}

#[async_trait]
impl TokenEndpoint for ReqwestHttpInvoker {
    async fn request_client_credentials_token(
        &self,
        request: &TokenRequest,
    ) -> AppResult<TokenResponse> {
        let response = self
            .token_client
            .post(request.auth_server.as_str())
            .basic_auth(
                request.client_id.as_str(),
                Some(request.client_secret.as_str()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("token request failed: {error}")))?;

        let status_code = response.status().as_u16();
        let body = response.text().await.map_err(|error| {
            AppError::Internal(format!("failed to read token response body: {error}"))
        })?;

        Ok(TokenResponse { status_code, body })
    }
}

#[cfg(test)]
mod tests;
