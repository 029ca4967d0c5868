use std::time::Duration;

use apiconnector_core::AppResult;
use async_trait::async_trait;

/// Port for submitting execution messages to a named task queue.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Submits one message and returns the task identifier.
    async fn submit(&self, queue_name: &str, message: Vec<u8>) -> AppResult<String>;

    /// Returns how many tasks are waiting in one queue.
    async fn pending_count(&self, queue_name: &str) -> AppResult<u64>;
}

/// One delivered task with its redelivery counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    /// Identifier assigned on first submission.
    pub task_id: String,
    /// Queue the task was taken from.
    pub queue_name: String,
    /// Delivery attempt, starting at one.
    pub attempt: u32,
    /// Message bytes as submitted.
    pub payload: Vec<u8>,
    /// Handle of the in-flight copy held by the consumer that received it.
    pub receipt: String,
}

/// Port used by queue workers to take and redeliver tasks.
///
/// A received task stays in the consumer's in-flight set until it is
/// acknowledged or redelivered, so a crash mid-delivery never loses it.
#[async_trait]
pub trait TaskQueueConsumer: Send + Sync {
    /// Waits up to `timeout` for the next task across the given queues and marks it in flight.
    async fn receive(
        &self,
        queue_names: &[String],
        timeout: Duration,
    ) -> AppResult<Option<QueuedTask>>;

    /// Removes a delivered task from the in-flight set.
    async fn acknowledge(&self, task: &QueuedTask) -> AppResult<()>;

    /// Puts a task back with its attempt counter incremented and releases the in-flight copy.
    async fn redeliver(&self, task: &QueuedTask) -> AppResult<()>;

    /// Returns tasks left in flight by a previous run of this consumer to their queues.
    async fn recover_in_flight(&self) -> AppResult<u64>;
}
