//! Ports implemented by infrastructure adapters.

mod http_invoker;
mod message_bus;
mod secret_resolver;
mod task_queue;
mod telemetry_store;
mod token_endpoint;

pub use http_invoker::{HttpInvoker, InvokedResponse, OutboundRequest};
pub use message_bus::MessageBus;
pub use secret_resolver::SecretResolver;
pub use task_queue::{QueuedTask, TaskQueue, TaskQueueConsumer};
pub use telemetry_store::TelemetryStore;
pub use token_endpoint::{TokenEndpoint, TokenRequest, TokenResponse};
