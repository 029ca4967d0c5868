use std::collections::HashMap;

use apiconnector_application::SecretResolver;
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;

/// Fixed secret map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretResolver {
    secrets: HashMap<String, Value>,
}

impl InMemorySecretResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one secret.
    #[must_use]
    pub fn with_secret(mut self, secret_id: impl Into<String>, payload: Value) -> Self {
        self.secrets.insert(secret_id.into(), payload);
        self
    }
}

#[async_trait]
impl SecretResolver for InMemorySecretResolver {
    async fn resolve(&self, secret_id: &str) -> AppResult<Value> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))
    }
}
