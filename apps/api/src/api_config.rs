use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use apiconnector_core::AppError;
use apiconnector_domain::TopicRoutes;
use tracing_subscriber::EnvFilter;

const DEFAULT_USER_AGENT: &str = concat!("apiconnector/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub enum SecretProviderConfig {
    Env { prefix: String },
    Directory { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub environment: String,
    pub database_url: String,
    pub redis_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub topic_routes: TopicRoutes,
    pub token_auth_scheme: String,
    pub secret_provider: SecretProviderConfig,
    pub task_queue_key_prefix: String,
    pub http_user_agent: String,
}

impl ConnectorConfig {
    pub fn load() -> Result<Self, AppError> {
        let environment = connector_environment();
        let database_url = required_non_empty_env("DATABASE_URL")?;
        let redis_url = required_non_empty_env("REDIS_URL")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let topic_routes =
            TopicRoutes::from_json(env::var("CONNECTOR_TOPIC_ROUTES").unwrap_or_default().as_str())
                .map_err(|error| {
                    AppError::Validation(format!("invalid CONNECTOR_TOPIC_ROUTES: {error}"))
                })?;

        let token_auth_scheme = env::var("TOKEN_AUTH_SCHEME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "access_token".to_owned());

        let secret_provider = match env::var("SECRET_PROVIDER")
            .unwrap_or_else(|_| "env".to_owned())
            .as_str()
        {
            "env" => SecretProviderConfig::Env {
                prefix: env::var("SECRET_ENV_PREFIX")
                    .unwrap_or_else(|_| "CONNECTOR_SECRET_".to_owned()),
            },
            "directory" => SecretProviderConfig::Directory {
                path: PathBuf::from(required_non_empty_env("SECRET_DIRECTORY")?),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "SECRET_PROVIDER must be either 'env' or 'directory', got '{other}'"
                )));
            }
        };

        let task_queue_key_prefix = env::var("TASK_QUEUE_KEY_PREFIX")
            .unwrap_or_else(|_| "apiconnector:queue".to_owned());
        let http_user_agent =
            env::var("HTTP_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_owned());

        Ok(Self {
            environment,
            database_url,
            redis_url,
            api_host,
            api_port,
            topic_routes,
            token_auth_scheme,
            secret_provider,
            task_queue_key_prefix,
            http_user_agent,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn connector_environment() -> String {
    env::var("CONNECTOR_ENVIRONMENT").unwrap_or_else(|_| "production".to_owned())
}

/// Local and development environments log at debug level unless `RUST_LOG` is set.
pub fn init_tracing(environment: &str) {
    let default_level = match environment {
        "local" | "development" => "debug",
        _ => "info",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
