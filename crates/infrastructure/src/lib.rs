//! Infrastructure adapters for connector ports.

#![forbid(unsafe_code)]

mod directory_secret_resolver;
mod env_secret_resolver;
mod in_memory_message_bus;
mod in_memory_secret_resolver;
mod in_memory_task_queue;
mod in_memory_telemetry_store;
mod postgres_telemetry_store;
mod redis_message_bus;
mod redis_task_queue;
mod reqwest_http_invoker;

pub use directory_secret_resolver::DirectorySecretResolver;
pub use env_secret_resolver::EnvSecretResolver;
pub use in_memory_message_bus::InMemoryMessageBus;
pub use in_memory_secret_resolver::InMemorySecretResolver;
pub use in_memory_task_queue::InMemoryTaskQueue;
pub use in_memory_telemetry_store::InMemoryTelemetryStore;
pub use postgres_telemetry_store::PostgresTelemetryStore;
pub use redis_message_bus::RedisMessageBus;
pub use redis_task_queue::RedisTaskQueue;
pub use reqwest_http_invoker::ReqwestHttpInvoker;
