//! Environment-variable secret lookup.

use apiconnector_application::SecretResolver;
use apiconnector_core::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;

/// Reads JSON secrets from `{prefix}{NAME}` environment variables.
///
/// The secret name is upper-cased and every non-alphanumeric character is
/// replaced with `_`.
#[derive(Debug, Clone)]
pub struct EnvSecretResolver {
    prefix: String,
}

impl EnvSecretResolver {
    /// Creates a resolver with the given variable prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn variable_for(&self, secret_id: &str) -> String {
        let suffix: String = secret_id
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() {
                    character.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        format!("{}{suffix}", self.prefix)
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(&self, secret_id: &str) -> AppResult<Value> {
        let variable = self.variable_for(secret_id);
        let raw = std::env::var(variable.as_str())
            .map_err(|_| AppError::NotFound(format!("secret '{secret_id}' is not configured")))?;

        parse_secret(secret_id, raw.as_str())
    }
}

/// Parses a secret payload, requiring a JSON object.
pub(crate) fn parse_secret(secret_id: &str, raw: &str) -> AppResult<Value> {
    let payload: Value = serde_json::from_str(raw).map_err(|error| {
        AppError::Validation(format!("secret '{secret_id}' is not valid JSON: {error}"))
    })?;

    if !payload.is_object() {
        return Err(AppError::Validation(format!(
            "secret '{secret_id}' must be a JSON object"
        )));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::{EnvSecretResolver, parse_secret};

    #[test]
    fn secret_names_map_to_upper_snake_variables() {
        let resolver = EnvSecretResolver::new("CONNECTOR_SECRET_");

        assert_eq!(
            resolver.variable_for("partner-api.prod"),
            "CONNECTOR_SECRET_PARTNER_API_PROD"
        );
    }

    #[test]
    fn secret_payload_must_be_an_object() {
        assert!(parse_secret("s", r#"{"username":"svc"}"#).is_ok());
        assert!(parse_secret("s", r#"["svc"]"#).is_err());
        assert!(parse_secret("s", "svc:pw").is_err());
    }

    #[tokio::test]
    async fn unset_secret_is_not_found() {
        use apiconnector_application::SecretResolver;

        let resolver = EnvSecretResolver::new("APICONNECTOR_TEST_UNSET_");
        let result = resolver.resolve("missing-secret").await;

        assert!(matches!(
            result,
            Err(apiconnector_core::AppError::NotFound(_))
        ));
    }
}
