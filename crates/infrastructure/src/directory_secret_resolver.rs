//! Mounted-directory secret lookup.

use std::path::PathBuf;

use apiconnector_application::SecretResolver;
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;

use crate::env_secret_resolver::parse_secret;

/// Reads JSON secrets from `{directory}/{secret_name}` files.
#[derive(Debug, Clone)]
pub struct DirectorySecretResolver {
    directory: PathBuf,
}

impl DirectorySecretResolver {
    /// Creates a resolver rooted at `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, secret_id: &str) -> AppResult<PathBuf> {
        let valid = !secret_id.is_empty()
            && !secret_id.starts_with('.')
            && secret_id.chars().all(|character| {
                character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.')
            });

        if !valid {
            return Err(AppError::Validation(format!(
                "invalid secret name '{secret_id}'"
            )));
        }

        Ok(self.directory.join(secret_id))
    }
}

#[async_trait]
impl SecretResolver for DirectorySecretResolver {
    async fn resolve(&self, secret_id: &str) -> AppResult<Value> {
        let path = self.path_for(secret_id)?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|error| {
            AppError::NotFound(format!("secret '{secret_id}' could not be read: {error}"))
        })?;

        parse_secret(secret_id, raw.trim())
    }
}
