use std::time::Duration;

use apiconnector_application::{QueuedTask, TaskQueueConsumer};
use apiconnector_core::AppResult;
use tracing::{error, warn};

/// What happens to a task after one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// The connector handled the message; remove it.
    Acknowledge,
    /// The connector or the network failed; put it back.
    Redeliver,
    /// Attempts are exhausted; discard it.
    Drop,
}

impl DeliveryDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::Redeliver => "redeliver",
            Self::Drop => "drop",
        }
    }

    /// 2xx and 4xx replies are final; 5xx replies and transport failures are retried.
    pub fn for_reply(status_code: Option<u16>, attempt: u32, max_attempts: u32) -> Self {
        match status_code {
            Some(code) if (200..300).contains(&code) || (400..500).contains(&code) => {
                Self::Acknowledge
            }
            _ if attempt < max_attempts => Self::Redeliver,
            _ => Self::Drop,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub task_id: String,
    pub attempt: u32,
    pub decision: DeliveryDecision,
}

/// Posts queued execution messages to the connector and applies the redelivery policy.
pub struct TaskDeliverer {
    http_client: reqwest::Client,
    target_url: String,
    policy: DeliveryPolicy,
}

impl TaskDeliverer {
    pub fn new(http_client: reqwest::Client, target_url: String, policy: DeliveryPolicy) -> Self {
        Self {
            http_client,
            target_url,
            policy,
        }
    }

    /// Takes at most one task and delivers it; `None` when the poll timed out.
    ///
    /// The task stays in flight if acknowledging or redelivering it fails.
    pub async fn process_next(
        &self,
        consumer: &dyn TaskQueueConsumer,
        queue_names: &[String],
        poll_timeout: Duration,
    ) -> AppResult<Option<DeliveryOutcome>> {
        let Some(task) = consumer.receive(queue_names, poll_timeout).await? else {
            return Ok(None);
        };

        let status_code = self.deliver(&task).await;
        let decision =
            DeliveryDecision::for_reply(status_code, task.attempt, self.policy.max_attempts);
        let outcome = DeliveryOutcome {
            task_id: task.task_id.clone(),
            attempt: task.attempt,
            decision,
        };

        match decision {
            DeliveryDecision::Acknowledge => consumer.acknowledge(&task).await?,
            DeliveryDecision::Redeliver => {
                let delay = self
                    .policy
                    .retry_backoff
                    .saturating_mul(task.attempt.max(1));
                tokio::time::sleep(delay).await;
                consumer.redeliver(&task).await?;
            }
            DeliveryDecision::Drop => {
                error!(
                    task_id = %task.task_id,
                    queue_name = %task.queue_name,
                    attempt = task.attempt,
                    "dropping task after exhausting delivery attempts"
                );
                consumer.acknowledge(&task).await?;
            }
        }

        Ok(Some(outcome))
    }

    async fn deliver(&self, task: &QueuedTask) -> Option<u16> {
        let response = self
            .http_client
            .post(self.target_url.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(task.payload.clone())
            .send()
            .await;

        match response {
            Ok(response) => {
                let status_code = response.status().as_u16();
                if response.status().is_server_error() {
                    warn!(
                        task_id = %task.task_id,
                        status_code,
                        "connector rejected task delivery"
                    );
                }
                Some(status_code)
            }
            Err(error) => {
                warn!(
                    task_id = %task.task_id,
                    error = %error,
                    "failed to deliver task to connector"
                );
                None
            }
        }
    }
}
