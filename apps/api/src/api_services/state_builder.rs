use std::sync::Arc;

use apiconnector_application::{
    AuthStrategyResolver, EnqueueService, ExecutionService, FanOutPublisher, RequestRouter,
    SecretResolver, TaskQueue, TelemetryWriter,
};
use apiconnector_core::AppError;
use apiconnector_infrastructure::{
    DirectorySecretResolver, EnvSecretResolver, PostgresTelemetryStore, RedisMessageBus,
    RedisTaskQueue, ReqwestHttpInvoker,
};
use sqlx::PgPool;

use crate::api_config::{ConnectorConfig, SecretProviderConfig};
use crate::state::AppState;

use super::redis::build_redis_client;

pub fn build_app_state(pool: PgPool, config: &ConnectorConfig) -> Result<AppState, AppError> {
    let redis_client = build_redis_client(config.redis_url.as_str())?;

    let task_queue: Arc<dyn TaskQueue> = Arc::new(RedisTaskQueue::new(
        redis_client.clone(),
        config.task_queue_key_prefix.clone(),
    ));
    let telemetry = TelemetryWriter::new(Arc::new(PostgresTelemetryStore::new(pool.clone())));
    let http_invoker = Arc::new(ReqwestHttpInvoker::build(config.http_user_agent.as_str())?);
    let secret_resolver: Arc<dyn SecretResolver> = match &config.secret_provider {
        SecretProviderConfig::Env { prefix } => Arc::new(EnvSecretResolver::new(prefix.clone())),
        SecretProviderConfig::Directory { path } => {
            Arc::new(DirectorySecretResolver::new(path.clone()))
        }
    };

    let execution_service = ExecutionService::new(
        secret_resolver,
        AuthStrategyResolver::new(http_invoker.clone(), config.token_auth_scheme.clone()),
        http_invoker,
        telemetry.clone(),
        FanOutPublisher::new(
            Arc::new(RedisMessageBus::new(redis_client.clone())),
            config.topic_routes.clone(),
        ),
    );
    let enqueue_service = EnqueueService::new(task_queue.clone(), telemetry);

    Ok(AppState {
        request_router: RequestRouter::new(enqueue_service, execution_service),
        task_queue,
        postgres_pool: Some(pool),
        redis_client: Some(redis_client),
    })
}
