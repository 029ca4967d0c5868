use apiconnector_core::AppResult;
use async_trait::async_trait;
use serde_json::Value;

/// Port for secret lookup by identifier.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Returns the structured secret payload, failing when it is missing or inaccessible.
    async fn resolve(&self, secret_id: &str) -> AppResult<Value>;
}
