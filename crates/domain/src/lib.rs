//! Domain types and invariants for warehouse-originated external API calls.

#![forbid(unsafe_code)]

mod auth;
mod call;
mod error;
mod execution;
mod http_method;
pub mod json_text;
pub mod query_string;
mod request_body;
mod source;
mod telemetry;
mod topic;

pub use auth::{AuthDescriptor, AuthStrategy, AuthType, Credential, SecretBundle};
pub use call::{CALL_ARGUMENT_ORDER, CallDescriptor, ExecutionMessage};
pub use error::DescriptorError;
pub use execution::{DEFAULT_TIMEOUT, ExecutionRequest, RequestConfig};
pub use http_method::HttpMethod;
pub use request_body::OutboundBody;
pub use source::RequestSource;
pub use telemetry::{
    ProcessLogRow, ProcessOutcome, ResultRequest, ResultResponse, ResultRow, TelemetryRow,
    TelemetryTables, log_table_for, result_table_for,
};
pub use topic::TopicRoutes;
