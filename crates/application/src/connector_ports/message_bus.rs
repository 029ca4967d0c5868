use apiconnector_core::AppResult;
use async_trait::async_trait;

/// Port for fire-and-forget message-bus publication.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes one payload to a topic.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()>;
}
