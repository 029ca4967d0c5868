use apiconnector_core::{AppError, AppResult};
use apiconnector_domain::{ExecutionMessage, RequestSource};
use http::StatusCode;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{EnqueueService, ExecutionService};

/// Body of a routed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchBody {
    /// Structured reply.
    Json(Value),
    /// Raw text, forwarded as received from the external API.
    Text(String),
}

/// Status and body returned for one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReply {
    /// Status reported to the caller.
    pub status: StatusCode,
    /// Reply body.
    pub body: DispatchBody,
}

impl DispatchReply {
    fn unprocessable(message: String) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: DispatchBody::Json(json!({"error": message})),
        }
    }
}

/// Top-level entry that dispatches on the `source` discriminator.
#[derive(Clone)]
pub struct RequestRouter {
    enqueue: EnqueueService,
    execution: ExecutionService,
}

impl RequestRouter {
    /// Creates a router over both phase handlers.
    #[must_use]
    pub fn new(enqueue: EnqueueService, execution: ExecutionService) -> Self {
        Self { enqueue, execution }
    }

    /// Routes one raw request body.
    ///
    /// Enqueue batches reply 200 with per-call replies; handled executions
    /// reply 202 whatever the external status was.
    pub async fn dispatch(&self, body: &[u8]) -> AppResult<DispatchReply> {
        let Some(Value::Object(request)) = serde_json::from_slice::<Value>(body).ok() else {
            return Err(AppError::Validation("invalid request".to_owned()));
        };

        let source = match RequestSource::from_discriminator(request.get("source")) {
            Ok(source) => source,
            Err(rejection) => {
                warn!(error = %rejection, "rejected request source");
                return Ok(DispatchReply::unprocessable(rejection.to_string()));
            }
        };

        info!(source = source.as_str(), "routing request");

        match source {
            RequestSource::Enqueue => self.enqueue(&request).await,
            RequestSource::Execution => Ok(self.execute(Value::Object(request)).await),
        }
    }

    async fn enqueue(&self, request: &serde_json::Map<String, Value>) -> AppResult<DispatchReply> {
        let Some(calls) = request.get("calls").and_then(Value::as_array) else {
            return Err(AppError::Validation("missing property: 'calls'".to_owned()));
        };

        let replies = self.enqueue.enqueue_batch(calls).await;

        Ok(DispatchReply {
            status: StatusCode::OK,
            body: DispatchBody::Json(json!({"replies": replies})),
        })
    }

    async fn execute(&self, request: Value) -> DispatchReply {
        let message = match serde_json::from_value::<ExecutionMessage>(request) {
            Ok(message) => message,
            Err(error) => {
                return DispatchReply::unprocessable(format!(
                    "malformed execution message: {error}"
                ));
            }
        };

        match self.execution.execute(&message).await {
            Ok(outcome) => DispatchReply {
                status: StatusCode::ACCEPTED,
                body: DispatchBody::Text(outcome.body),
            },
            Err(rejection) => {
                warn!(error = %rejection, "rejected execution message");
                DispatchReply::unprocessable(rejection.to_string())
            }
        }
    }
}
