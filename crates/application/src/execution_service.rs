use std::sync::Arc;
use std::time::Duration;

use apiconnector_domain::{
    AuthDescriptor, Credential, DescriptorError, ExecutionMessage, ExecutionRequest,
    OutboundBody, ProcessLogRow, ProcessOutcome, ResultRequest, ResultResponse, ResultRow,
    SecretBundle, TelemetryRow,
};
use chrono::Utc;
use http::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::connector_ports::{HttpInvoker, InvokedResponse, OutboundRequest, SecretResolver};
use crate::{AuthFailure, AuthStrategyResolver, FanOutOutcome, FanOutPublisher, TelemetryWriter};

/// Whether each telemetry write of one execution was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryDelivery {
    /// Result-table row confirmed.
    pub result_row: bool,
    /// Log-table row confirmed.
    pub log_row: bool,
}

/// Outcome of one execution-phase call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Shaped response body, or failure text.
    pub body: String,
    /// External status, or the status assigned to a local failure.
    pub status: StatusCode,
    /// Telemetry delivery flags.
    pub telemetry: TelemetryDelivery,
    /// Fan-out result; `None` when the external call was never attempted.
    pub fan_out: Option<FanOutOutcome>,
}

struct CallFailure {
    status: StatusCode,
    message: String,
}

impl From<AuthFailure> for CallFailure {
    fn from(value: AuthFailure) -> Self {
        Self {
            status: value.status(),
            message: value.message(),
        }
    }
}

impl From<DescriptorError> for CallFailure {
    fn from(value: DescriptorError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: value.to_string(),
        }
    }
}

enum CallResult {
    Completed(InvokedResponse),
    TransportFailed { message: String, elapsed: Duration },
}

/// Execution phase: authenticates, calls the external API, records telemetry and fans out.
#[derive(Clone)]
pub struct ExecutionService {
    secret_resolver: Arc<dyn SecretResolver>,
    auth_resolver: AuthStrategyResolver,
    http_invoker: Arc<dyn HttpInvoker>,
    telemetry: TelemetryWriter,
    fan_out: FanOutPublisher,
}

impl ExecutionService {
    /// Creates an execution service.
    #[must_use]
    pub fn new(
        secret_resolver: Arc<dyn SecretResolver>,
        auth_resolver: AuthStrategyResolver,
        http_invoker: Arc<dyn HttpInvoker>,
        telemetry: TelemetryWriter,
        fan_out: FanOutPublisher,
    ) -> Self {
        Self {
            secret_resolver,
            auth_resolver,
            http_invoker,
            telemetry,
            fan_out,
        }
    }

    /// Executes one queued call.
    ///
    /// Returns an error only when the message lacks the structure needed to
    /// record telemetry; every other failure is reported in the outcome after
    /// one result row and one log row have been attempted.
    pub async fn execute(
        &self,
        message: &ExecutionMessage,
    ) -> Result<ExecutionOutcome, DescriptorError> {
        debug!("execution message received");

        let request = ExecutionRequest::from_message(message)?;
        info!(
            tables = %request.tables.display_pattern(),
            "results will be sent to the telemetry tables"
        );

        let auth_type = request
            .auth
            .as_ref()
            .map(|auth| auth.auth_type_label().to_owned())
            .unwrap_or_default();

        let outbound = match self.prepare_call(&request).await {
            Ok(outbound) => outbound,
            Err(failure) => {
                return Ok(self
                    .finish_without_call(&request, &auth_type, failure)
                    .await);
            }
        };

        let started = std::time::Instant::now();
        let result = match self.http_invoker.invoke(outbound).await {
            Ok(response) => CallResult::Completed(response),
            Err(failure) => CallResult::TransportFailed {
                message: failure.to_string(),
                elapsed: started.elapsed(),
            },
        };

        Ok(self.finish_call(&request, &auth_type, result).await)
    }

    async fn prepare_call(
        &self,
        request: &ExecutionRequest,
    ) -> Result<OutboundRequest, CallFailure> {
        let credential = match &request.auth {
            Some(auth) => self.resolve_credential(auth).await?,
            None => Credential::Anonymous,
        };
        let method = request.request_config.method()?;

        Ok(OutboundRequest {
            method,
            uri: request.request_config.uri().to_owned(),
            headers: request.headers.clone(),
            query_string: request.query_string.clone(),
            body: OutboundBody::from_value(&request.body, &request.headers),
            timeout: request.request_config.timeout(),
            credential,
        })
    }

    async fn resolve_credential(&self, auth: &AuthDescriptor) -> Result<Credential, CallFailure> {
        let secret = self.fetch_secret(auth).await?;
        let strategy = auth.strategy()?;
        let credential = self.auth_resolver.resolve(&strategy, &secret).await?;

        info!(
            auth_type = strategy.auth_type().as_str(),
            "credential processing complete"
        );

        Ok(credential)
    }

    async fn fetch_secret(&self, auth: &AuthDescriptor) -> Result<SecretBundle, CallFailure> {
        let unavailable = |detail: String| CallFailure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Could not retrieve secret: {detail}"),
        };

        let secret_name = auth
            .secret_name()
            .map_err(|error| unavailable(error.to_string()))?;
        let payload = self
            .secret_resolver
            .resolve(secret_name)
            .await
            .map_err(|error| unavailable(error.to_string()))?;
        let secret =
            SecretBundle::from_value(payload).map_err(|error| unavailable(error.to_string()))?;

        info!(secret_name = %secret_name, "obtained secret authentication data");

        Ok(secret)
    }

    async fn finish_without_call(
        &self,
        request: &ExecutionRequest,
        auth_type: &str,
        failure: CallFailure,
    ) -> ExecutionOutcome {
        error!(
            status = failure.status.as_u16(),
            error = %failure.message,
            "execution stopped before the external call"
        );

        let telemetry = self
            .record(
                request,
                auth_type,
                Duration::ZERO,
                ResultResponse {
                    status_code: failure.status.as_u16(),
                    headers: "{}".to_owned(),
                    body: failure.message.clone(),
                },
            )
            .await;

        ExecutionOutcome {
            body: failure.message,
            status: failure.status,
            telemetry,
            fan_out: None,
        }
    }

    async fn finish_call(
        &self,
        request: &ExecutionRequest,
        auth_type: &str,
        result: CallResult,
    ) -> ExecutionOutcome {
        match result {
            CallResult::Completed(response) => {
                info!(
                    status = response.status_code,
                    elapsed_ms = response.elapsed.as_millis(),
                    "external call completed"
                );

                let telemetry = self
                    .record(
                        request,
                        auth_type,
                        response.elapsed,
                        ResultResponse {
                            status_code: response.status_code,
                            headers: response.headers_json(),
                            body: response.body.clone(),
                        },
                    )
                    .await;
                let fan_out = self
                    .fan_out
                    .publish(request.workflow_id.as_deref(), response.body.as_str())
                    .await;

                ExecutionOutcome {
                    body: shape_response_body(&response),
                    status: StatusCode::from_u16(response.status_code)
                        .unwrap_or(StatusCode::BAD_GATEWAY),
                    telemetry,
                    fan_out: Some(fan_out),
                }
            }
            CallResult::TransportFailed { message, elapsed } => {
                warn!(error = %message, "external call failed");

                let message = format!("External call failed: {message}");
                let telemetry = self
                    .record(
                        request,
                        auth_type,
                        elapsed,
                        ResultResponse {
                            status_code: StatusCode::BAD_GATEWAY.as_u16(),
                            headers: "{}".to_owned(),
                            body: message.clone(),
                        },
                    )
                    .await;
                let fan_out = self
                    .fan_out
                    .publish(request.workflow_id.as_deref(), message.as_str())
                    .await;

                ExecutionOutcome {
                    body: message,
                    status: StatusCode::BAD_GATEWAY,
                    telemetry,
                    fan_out: Some(fan_out),
                }
            }
        }
    }

    async fn record(
        &self,
        request: &ExecutionRequest,
        auth_type: &str,
        elapsed: Duration,
        response: ResultResponse,
    ) -> TelemetryDelivery {
        let outcome = if (200..300).contains(&response.status_code) {
            ProcessOutcome::Succeeded {
                status_code: response.status_code,
            }
        } else {
            ProcessOutcome::Failed {
                status_code: response.status_code,
                error_message: response.body.clone(),
            }
        };

        let result_row = self
            .telemetry
            .write(
                request.tables.result_table(),
                TelemetryRow::Result(ResultRow {
                    request: ResultRequest {
                        uri: request.request_config.uri().to_owned(),
                        method: request.request_config.method_label().to_owned(),
                        auth_type: auth_type.to_owned(),
                        query_string: request.query_string.clone(),
                        body: request.body_text(),
                    },
                    request_time: Utc::now(),
                    elapsed_time: elapsed.as_secs_f64(),
                    response,
                }),
            )
            .await;

        let log_row = self
            .telemetry
            .write(
                request.tables.log_table(),
                TelemetryRow::ProcessLog(ProcessLogRow {
                    headers: request.headers_text(),
                    query_string: Some(request.query_string.clone()),
                    body: request.body_text(),
                    result: outcome.to_json().to_string(),
                    exec_time: Utc::now(),
                }),
            )
            .await;

        TelemetryDelivery {
            result_row,
            log_row,
        }
    }
}

/// Re-serializes declared JSON bodies and forwards everything else as raw text.
fn shape_response_body(response: &InvokedResponse) -> String {
    if !response.is_json() {
        return response.body.clone();
    }

    serde_json::from_str::<Value>(response.body.as_str())
        .map(|document| document.to_string())
        .unwrap_or_else(|_| response.body.clone())
}
