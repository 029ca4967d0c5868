use std::sync::Arc;

use apiconnector_domain::{
    CallDescriptor, ExecutionMessage, ProcessLogRow, ProcessOutcome, TelemetryRow, json_text,
    log_table_for,
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::TelemetryWriter;
use crate::connector_ports::TaskQueue;

/// Enqueue phase: repackages warehouse calls as execution messages on a task queue.
#[derive(Clone)]
pub struct EnqueueService {
    task_queue: Arc<dyn TaskQueue>,
    telemetry: TelemetryWriter,
}

impl EnqueueService {
    /// Creates an enqueue service.
    #[must_use]
    pub fn new(task_queue: Arc<dyn TaskQueue>, telemetry: TelemetryWriter) -> Self {
        Self {
            task_queue,
            telemetry,
        }
    }

    /// Enqueues every call in a batch and returns one reply per call, in input order.
    ///
    /// A malformed call yields an error reply at its position and does not
    /// affect the rest of the batch.
    pub async fn enqueue_batch(&self, calls: &[Value]) -> Vec<Value> {
        debug!(calls = calls.len(), "warehouse batch received");

        let mut replies = Vec::with_capacity(calls.len());
        for arguments in calls {
            replies.push(self.enqueue_call(arguments).await);
        }

        replies
    }

    async fn enqueue_call(&self, arguments: &Value) -> Value {
        let call = match CallDescriptor::from_positional(arguments) {
            Ok(call) => call,
            Err(rejection) => {
                error!(error = %rejection, "failed to bind warehouse call arguments");
                return json!({"error": rejection.to_string()});
            }
        };

        let log_table = match call.result_table() {
            Ok(result_table) => log_table_for(result_table),
            Err(rejection) => {
                error!(error = %rejection, "warehouse call has no result table");
                return json!({"error": rejection.to_string()});
            }
        };

        let outcome = match self.submit(&call).await {
            Ok(task_id) => {
                info!(task_id = %task_id, log_table = %log_table, "created task");
                ProcessOutcome::Queued
            }
            Err(detail) => {
                error!(log_table = %log_table, error = %detail, "failed to add request to the queue");
                ProcessOutcome::QueueFailed(detail)
            }
        };

        let reply = outcome.to_json();
        self.telemetry
            .write(
                log_table.as_str(),
                TelemetryRow::ProcessLog(ProcessLogRow {
                    headers: json_text::to_text(&call.headers),
                    query_string: json_text::to_text(&call.query_string),
                    body: json_text::to_text(&call.body),
                    result: reply.to_string(),
                    exec_time: Utc::now(),
                }),
            )
            .await;

        reply
    }

    async fn submit(&self, call: &CallDescriptor) -> Result<String, String> {
        let queue_name = call.queue_name().map_err(|error| error.to_string())?;
        let message = ExecutionMessage::from_call(call)
            .to_bytes()
            .map_err(|error| format!("failed to encode execution message: {error}"))?;

        self.task_queue
            .submit(queue_name, message)
            .await
            .map_err(|error| error.to_string())
    }
}
