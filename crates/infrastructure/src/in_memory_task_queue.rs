//! Process-local task queue.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use apiconnector_application::{QueuedTask, TaskQueue, TaskQueueConsumer};
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

/// In-memory FIFO queues keyed by name, with one in-flight set.
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    queues: Mutex<HashMap<String, VecDeque<QueuedTask>>>,
    in_flight: Mutex<Vec<QueuedTask>>,
    notify: Notify,
}

impl InMemoryTaskQueue {
    /// Creates an empty queue set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many received tasks are neither acknowledged nor redelivered.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    async fn take_in_flight(&self, receipt: &str) -> Option<QueuedTask> {
        let mut in_flight = self.in_flight.lock().await;
        let position = in_flight.iter().position(|task| task.receipt == receipt)?;
        Some(in_flight.remove(position))
    }

    async fn push(&self, task: QueuedTask) {
        self.queues
            .lock()
            .await
            .entry(task.queue_name.clone())
            .or_default()
            .push_back(task);
        self.notify.notify_waiters();
    }

    async fn try_pop(&self, queue_names: &[String]) -> Option<QueuedTask> {
        let mut queues = self.queues.lock().await;
        let mut task = queue_names
            .iter()
            .find_map(|queue_name| queues.get_mut(queue_name).and_then(VecDeque::pop_front))?;
        task.receipt = uuid::Uuid::new_v4().to_string();
        self.in_flight.lock().await.push(task.clone());
        Some(task)
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn submit(&self, queue_name: &str, message: Vec<u8>) -> AppResult<String> {
        if queue_name.trim().is_empty() {
            return Err(AppError::Validation("queue name must not be empty".to_owned()));
        }

        let task_id = uuid::Uuid::new_v4().to_string();
        self.push(QueuedTask {
            task_id: task_id.clone(),
            queue_name: queue_name.to_owned(),
            attempt: 1,
            payload: message,
            receipt: String::new(),
        })
        .await;

        Ok(task_id)
    }

    async fn pending_count(&self, queue_name: &str) -> AppResult<u64> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(queue_name)
            .map_or(0, |queue| u64::try_from(queue.len()).unwrap_or(u64::MAX)))
    }
}

#[async_trait]
impl TaskQueueConsumer for InMemoryTaskQueue {
    async fn receive(
        &self,
        queue_names: &[String],
        timeout: Duration,
    ) -> AppResult<Option<QueuedTask>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notified = self.notify.notified();
            if let Some(task) = self.try_pop(queue_names).await {
                return Ok(Some(task));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(self.try_pop(queue_names).await);
            }
        }
    }

    async fn acknowledge(&self, task: &QueuedTask) -> AppResult<()> {
        self.take_in_flight(task.receipt.as_str()).await;
        Ok(())
    }

    async fn redeliver(&self, task: &QueuedTask) -> AppResult<()> {
        if let Some(mut task) = self.take_in_flight(task.receipt.as_str()).await {
            task.attempt = task.attempt.saturating_add(1);
            task.receipt.clear();
            self.push(task).await;
        }
        Ok(())
    }

    async fn recover_in_flight(&self) -> AppResult<u64> {
        let tasks: Vec<QueuedTask> = self.in_flight.lock().await.drain(..).collect();
        let recovered = u64::try_from(tasks.len()).unwrap_or(u64::MAX);
        {
            let mut queues = self.queues.lock().await;
            for mut task in tasks.into_iter().rev() {
                task.receipt.clear();
                queues
                    .entry(task.queue_name.clone())
                    .or_default()
                    .push_front(task);
            }
        }
        self.notify.notify_waiters();
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use apiconnector_application::{TaskQueue, TaskQueueConsumer};

    use super::InMemoryTaskQueue;

    #[tokio::test]
    async fn tasks_are_received_in_submission_order() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.submit("partners", b"first".to_vec()).await.is_ok());
        assert!(queue.submit("partners", b"second".to_vec()).await.is_ok());
        assert_eq!(queue.pending_count("partners").await.ok(), Some(2));

        let names = vec!["partners".to_owned()];
        let first = queue.receive(&names, Duration::from_millis(10)).await;
        let second = queue.receive(&names, Duration::from_millis(10)).await;

        assert_eq!(
            first.ok().flatten().map(|task| task.payload),
            Some(b"first".to_vec())
        );
        assert_eq!(
            second.ok().flatten().map(|task| task.payload),
            Some(b"second".to_vec())
        );
        assert_eq!(queue.pending_count("partners").await.ok(), Some(0));
    }

    #[tokio::test]
    async fn receive_times_out_on_empty_queue() {
        let queue = InMemoryTaskQueue::new();
        let received = queue
            .receive(&["partners".to_owned()], Duration::from_millis(20))
            .await;

        assert_eq!(received.ok(), Some(None));
    }

    #[tokio::test]
    async fn redelivery_increments_attempt() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.submit("partners", b"payload".to_vec()).await.is_ok());
        let names = vec!["partners".to_owned()];

        let Ok(Some(task)) = queue.receive(&names, Duration::from_millis(10)).await else {
            panic!("submitted task should be received");
        };
        assert_eq!(task.attempt, 1);
        assert!(queue.redeliver(&task).await.is_ok());
        assert_eq!(queue.in_flight_count().await, 0);

        let Ok(Some(task)) = queue.receive(&names, Duration::from_millis(10)).await else {
            panic!("redelivered task should be received");
        };
        assert_eq!(task.attempt, 2);
    }

    #[tokio::test]
    async fn received_task_stays_in_flight_until_acknowledged() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.submit("partners", b"payload".to_vec()).await.is_ok());
        let names = vec!["partners".to_owned()];

        let Ok(Some(task)) = queue.receive(&names, Duration::from_millis(10)).await else {
            panic!("submitted task should be received");
        };
        assert_eq!(queue.in_flight_count().await, 1);

        assert!(queue.acknowledge(&task).await.is_ok());
        assert_eq!(queue.in_flight_count().await, 0);
        assert_eq!(queue.pending_count("partners").await.ok(), Some(0));
    }

    #[tokio::test]
    async fn recovery_returns_unacknowledged_tasks_to_the_front() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.submit("partners", b"first".to_vec()).await.is_ok());
        assert!(queue.submit("partners", b"second".to_vec()).await.is_ok());
        let names = vec!["partners".to_owned()];

        let Ok(Some(_)) = queue.receive(&names, Duration::from_millis(10)).await else {
            panic!("submitted task should be received");
        };
        assert_eq!(queue.recover_in_flight().await.ok(), Some(1));
        assert_eq!(queue.in_flight_count().await, 0);

        let Ok(Some(task)) = queue.receive(&names, Duration::from_millis(10)).await else {
            panic!("recovered task should be received");
        };
        assert_eq!(task.payload, b"first".to_vec());
        assert_eq!(task.attempt, 1);
    }
}
