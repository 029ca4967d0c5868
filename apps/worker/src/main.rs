//! Task-queue worker that delivers queued execution messages to the connector API.

#![forbid(unsafe_code)]

mod delivery;

use std::env;
use std::time::Duration;

use apiconnector_application::TaskQueueConsumer;
use apiconnector_core::{AppError, AppResult};
use apiconnector_infrastructure::RedisTaskQueue;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::delivery::{DeliveryPolicy, TaskDeliverer};

#[derive(Debug, Clone)]
struct WorkerConfig {
    redis_url: String,
    task_queue_key_prefix: String,
    queue_names: Vec<String>,
    target_url: String,
    worker_id: String,
    poll_timeout_seconds: u64,
    max_delivery_attempts: u32,
    retry_backoff_ms: u64,
    delivery_timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let task_queue = RedisTaskQueue::new(redis_client, config.task_queue_key_prefix.clone())
        .with_consumer_id(config.worker_id.clone());
    let recovered = task_queue.recover_in_flight().await?;
    if recovered > 0 {
        warn!(
            worker_id = %config.worker_id,
            recovered,
            "returned unfinished tasks from a previous run to their queues"
        );
    }
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.delivery_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let deliverer = TaskDeliverer::new(
        http_client,
        config.target_url.clone(),
        DeliveryPolicy {
            max_attempts: config.max_delivery_attempts,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        },
    );

    info!(
        worker_id = %config.worker_id,
        target_url = %config.target_url,
        queues = %config.queue_names.join(","),
        max_delivery_attempts = config.max_delivery_attempts,
        "apiconnector-worker started"
    );

    let poll_timeout = Duration::from_secs(config.poll_timeout_seconds);
    loop {
        match deliverer
            .process_next(&task_queue, &config.queue_names, poll_timeout)
            .await
        {
            Ok(Some(outcome)) => info!(
                worker_id = %config.worker_id,
                task_id = %outcome.task_id,
                attempt = outcome.attempt,
                decision = outcome.decision.as_str(),
                "task delivery finished"
            ),
            Ok(None) => {}
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to process task"
                );
                tokio::time::sleep(poll_timeout.min(Duration::from_secs(1))).await;
            }
        }
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let redis_url = required_env("REDIS_URL")?;
        let task_queue_key_prefix = env::var("TASK_QUEUE_KEY_PREFIX")
            .unwrap_or_else(|_| "apiconnector:queue".to_owned());
        let queue_names: Vec<String> = required_env("WORKER_QUEUES")?
            .split(',')
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .collect();
        let target_url =
            env::var("WORKER_TARGET_URL").unwrap_or_else(|_| "http://127.0.0.1:8080/".to_owned());
        let worker_id = env::var("WORKER_ID")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "worker".to_owned());
        let poll_timeout_seconds = parse_env_u64("WORKER_POLL_TIMEOUT_SECONDS", 5)?;
        let max_delivery_attempts = parse_env_u32("WORKER_MAX_DELIVERY_ATTEMPTS", 3)?;
        let retry_backoff_ms = parse_env_u64("WORKER_RETRY_BACKOFF_MS", 500)?;
        let delivery_timeout_seconds = parse_env_u64("WORKER_DELIVERY_TIMEOUT_SECONDS", 60)?;

        if queue_names.is_empty() {
            return Err(AppError::Validation(
                "WORKER_QUEUES must name at least one queue".to_owned(),
            ));
        }

        if poll_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if max_delivery_attempts == 0 {
            return Err(AppError::Validation(
                "WORKER_MAX_DELIVERY_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        if delivery_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_DELIVERY_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            redis_url,
            task_queue_key_prefix,
            queue_names,
            target_url,
            worker_id,
            poll_timeout_seconds,
            max_delivery_attempts,
            retry_backoff_ms,
            delivery_timeout_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
