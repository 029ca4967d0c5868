//! Redis pub/sub message bus.

use apiconnector_application::MessageBus;
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use redis::AsyncCommands;

/// Publishes fan-out payloads on Redis channels.
#[derive(Clone)]
pub struct RedisMessageBus {
    client: redis::Client,
}

impl RedisMessageBus {
    /// Creates a bus adapter over a Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageBus for RedisMessageBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let _: i64 = connection.publish(topic, payload).await.map_err(|error| {
            AppError::Internal(format!("failed to publish to topic '{topic}': {error}"))
        })?;

        Ok(())
    }
}
