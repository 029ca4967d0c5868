use apiconnector_application::MessageBus;
use apiconnector_core::AppResult;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Records published payloads instead of sending them.
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl InMemoryMessageBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(topic, payload)` published so far.
    pub async fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        self.published
            .lock()
            .await
            .push((topic.to_owned(), payload));
        Ok(())
    }
}
