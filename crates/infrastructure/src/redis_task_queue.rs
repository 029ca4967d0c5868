//! Redis list-backed task queue.

use std::time::Duration;

use apiconnector_application::{QueuedTask, TaskQueue, TaskQueueConsumer};
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Direction, Script};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_CONSUMER_ID: &str = "default";
const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(100);

// KEYS[1] = in-flight list, KEYS[2] = queue list.
// ARGV[1] = in-flight entry, ARGV[2] = entry to queue, ARGV[3] = 'retry' (back of queue) or 'resume' (front).
const REQUEUE_SCRIPT: &str = r#"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) > 0 then
  if ARGV[3] == 'retry' then
    redis.call('LPUSH', KEYS[2], ARGV[2])
  else
    redis.call('RPUSH', KEYS[2], ARGV[2])
  end
  return 1
else
  return 0
end
"#;

/// Queue entry stored in Redis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TaskEnvelope {
    task_id: String,
    queue_name: String,
    attempt: u32,
    payload: String,
}

impl TaskEnvelope {
    fn encode(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|error| AppError::Internal(format!("failed to encode task envelope: {error}")))
    }

    fn decode(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|error| AppError::Internal(format!("invalid task envelope: {error}")))
    }
}

impl TaskEnvelope {
    fn into_task(self, receipt: String) -> QueuedTask {
        QueuedTask {
            task_id: self.task_id,
            queue_name: self.queue_name,
            attempt: self.attempt,
            payload: self.payload.into_bytes(),
            receipt,
        }
    }
}

/// Redis implementation of the task queue and consumer ports.
///
/// Producers `LPUSH` and consumers `LMOVE` from the right end into a per-consumer
/// in-flight list, so each queue is FIFO and a received task survives a worker crash.
#[derive(Clone)]
pub struct RedisTaskQueue {
    client: redis::Client,
    key_prefix: String,
    consumer_id: String,
}

impl RedisTaskQueue {
    /// Creates a queue adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            consumer_id: DEFAULT_CONSUMER_ID.to_owned(),
        }
    }

    /// Scopes the in-flight list to one consumer.
    #[must_use]
    pub fn with_consumer_id(mut self, consumer_id: impl Into<String>) -> Self {
        self.consumer_id = consumer_id.into();
        self
    }

    fn key_for(&self, queue_name: &str) -> String {
        format!("{}:{queue_name}", self.key_prefix)
    }

    fn in_flight_key(&self) -> String {
        format!("{}:in-flight:{}", self.key_prefix, self.consumer_id)
    }

    async fn try_move(
        &self,
        connection: &mut redis::aio::MultiplexedConnection,
        keys: &[String],
    ) -> AppResult<Option<String>> {
        let in_flight_key = self.in_flight_key();
        for key in keys {
            let moved: Option<String> = connection
                .lmove(key, in_flight_key.as_str(), Direction::Right, Direction::Left)
                .await
                .map_err(|error| AppError::Internal(format!("failed to take task: {error}")))?;
            if moved.is_some() {
                return Ok(moved);
            }
        }

        Ok(None)
    }

    async fn requeue(
        &self,
        receipt: &str,
        queue_key: &str,
        entry: &str,
        mode: &str,
    ) -> AppResult<bool> {
        let mut connection = self.connection().await?;
        let moved = Script::new(REQUEUE_SCRIPT)
            .key(self.in_flight_key())
            .key(queue_key)
            .arg(receipt)
            .arg(entry)
            .arg(mode)
            .invoke_async::<i32>(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to requeue task: {error}")))?;

        Ok(moved > 0)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn push(&self, envelope: &TaskEnvelope) -> AppResult<()> {
        let key = self.key_for(envelope.queue_name.as_str());
        let encoded = envelope.encode()?;
        let mut connection = self.connection().await?;

        let _: i64 = connection.lpush(key, encoded).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to push task onto queue '{}': {error}",
                envelope.queue_name
            ))
        })?;

        Ok(())
    }
}

fn validate_queue_name(queue_name: &str) -> AppResult<()> {
    if queue_name.trim().is_empty() {
        return Err(AppError::Validation("queue name must not be empty".to_owned()));
    }

    Ok(())
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn submit(&self, queue_name: &str, message: Vec<u8>) -> AppResult<String> {
        validate_queue_name(queue_name)?;
        let payload = String::from_utf8(message).map_err(|error| {
            AppError::Validation(format!("task payload must be UTF-8: {error}"))
        })?;

        let envelope = TaskEnvelope {
            task_id: uuid::Uuid::new_v4().to_string(),
            queue_name: queue_name.to_owned(),
            attempt: 1,
            payload,
        };
        self.push(&envelope).await?;

        Ok(envelope.task_id)
    }

    async fn pending_count(&self, queue_name: &str) -> AppResult<u64> {
        validate_queue_name(queue_name)?;
        let mut connection = self.connection().await?;

        connection
            .llen(self.key_for(queue_name))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read length of queue '{queue_name}': {error}"
                ))
            })
    }
}

#[async_trait]
impl TaskQueueConsumer for RedisTaskQueue {
    async fn receive(
        &self,
        queue_names: &[String],
        timeout: Duration,
    ) -> AppResult<Option<QueuedTask>> {
        if queue_names.is_empty() {
            return Err(AppError::Validation(
                "at least one queue name is required".to_owned(),
            ));
        }

        let keys: Vec<String> = queue_names
            .iter()
            .map(|queue_name| self.key_for(queue_name))
            .collect();
        let deadline = tokio::time::Instant::now() + timeout;
        let mut connection = self.connection().await?;

        loop {
            if let Some(raw) = self.try_move(&mut connection, &keys).await? {
                return TaskEnvelope::decode(raw.as_str()).map(|envelope| Some(envelope.into_task(raw)));
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(RECEIVE_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn acknowledge(&self, task: &QueuedTask) -> AppResult<()> {
        let mut connection = self.connection().await?;

        let _: i64 = connection
            .lrem(self.in_flight_key(), 1, task.receipt.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to acknowledge task '{}': {error}",
                    task.task_id
                ))
            })?;

        Ok(())
    }

    async fn redeliver(&self, task: &QueuedTask) -> AppResult<()> {
        let payload = String::from_utf8(task.payload.clone()).map_err(|error| {
            AppError::Validation(format!("task payload must be UTF-8: {error}"))
        })?;
        let retry = TaskEnvelope {
            task_id: task.task_id.clone(),
            queue_name: task.queue_name.clone(),
            attempt: task.attempt.saturating_add(1),
            payload,
        }
        .encode()?;

        let requeued = self
            .requeue(
                task.receipt.as_str(),
                self.key_for(task.queue_name.as_str()).as_str(),
                retry.as_str(),
                "retry",
            )
            .await?;
        if !requeued {
            warn!(
                task_id = %task.task_id,
                "task was no longer in flight; skipping redelivery"
            );
        }

        Ok(())
    }

    async fn recover_in_flight(&self) -> AppResult<u64> {
        let mut connection = self.connection().await?;
        let entries: Vec<String> = connection
            .lrange(self.in_flight_key(), 0, -1)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read in-flight tasks: {error}"))
            })?;

        let mut recovered = 0_u64;
        for raw in entries {
            let queue_name = match TaskEnvelope::decode(raw.as_str()) {
                Ok(envelope) => envelope.queue_name,
                Err(error) => {
                    warn!(error = %error, "discarding unreadable in-flight task");
                    let _: i64 = connection
                        .lrem(self.in_flight_key(), 1, raw.as_str())
                        .await
                        .map_err(|error| {
                            AppError::Internal(format!(
                                "failed to discard in-flight task: {error}"
                            ))
                        })?;
                    continue;
                }
            };

            if self
                .requeue(
                    raw.as_str(),
                    self.key_for(queue_name.as_str()).as_str(),
                    raw.as_str(),
                    "resume",
                )
                .await?
            {
                recovered += 1;
            }
        }

        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::{RedisTaskQueue, TaskEnvelope};

    #[test]
    fn keys_are_scoped_by_prefix() {
        let Ok(client) = redis::Client::open("redis://127.0.0.1:6379") else {
            panic!("redis url should parse");
        };
        let queue = RedisTaskQueue::new(client, "apiconnector:queue");

        assert_eq!(queue.key_for("partners"), "apiconnector:queue:partners");
    }

    #[test]
    fn in_flight_list_is_scoped_by_consumer() {
        let Ok(client) = redis::Client::open("redis://127.0.0.1:6379") else {
            panic!("redis url should parse");
        };
        let queue = RedisTaskQueue::new(client, "apiconnector:queue").with_consumer_id("worker-7");

        assert_eq!(queue.in_flight_key(), "apiconnector:queue:in-flight:worker-7");
    }

    #[test]
    fn envelope_keeps_payload_text() {
        let envelope = TaskEnvelope {
            task_id: "task-1".to_owned(),
            queue_name: "partners".to_owned(),
            attempt: 2,
            payload: r#"{"source":"EXECUTION"}"#.to_owned(),
        };

        let Ok(encoded) = envelope.encode() else {
            panic!("envelope should encode");
        };
        let decoded = TaskEnvelope::decode(encoded.as_str());

        assert_eq!(decoded.ok(), Some(envelope));
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        assert!(TaskEnvelope::decode("not json").is_err());
    }
}
