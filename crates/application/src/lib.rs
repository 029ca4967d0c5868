//! Application services and ports for the two-phase API connector.
//!
//! The enqueue phase turns warehouse call batches into task-queue messages;
//! the execution phase performs the authenticated external call, records
//! telemetry and fans the result out.

#![forbid(unsafe_code)]

mod auth_strategy_resolver;
pub mod connector_ports;
mod enqueue_service;
mod execution_service;
mod fan_out_publisher;
mod request_router;
mod telemetry_writer;

#[cfg(test)]
mod test_support;

pub use auth_strategy_resolver::{AuthFailure, AuthStrategyResolver};
pub use connector_ports::{
    HttpInvoker, InvokedResponse, MessageBus, OutboundRequest, QueuedTask, SecretResolver,
    TaskQueue, TaskQueueConsumer, TelemetryStore, TokenEndpoint, TokenRequest, TokenResponse,
};
pub use enqueue_service::EnqueueService;
pub use execution_service::{ExecutionOutcome, ExecutionService, TelemetryDelivery};
pub use fan_out_publisher::{FanOutOutcome, FanOutPublisher};
pub use request_router::{DispatchBody, DispatchReply, RequestRouter};
pub use telemetry_writer::TelemetryWriter;
