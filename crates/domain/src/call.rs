use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json_text::decode_lenient;
use crate::query_string::encode_query_string;
use crate::{DescriptorError, RequestSource};

/// Positional argument order of the warehouse function-call signature.
pub const CALL_ARGUMENT_ORDER: [&str; 8] = [
    "workflow_id",
    "request_config",
    "auth",
    "headers",
    "query_string",
    "body",
    "result_table",
    "queue_name",
];

/// One warehouse-originated external call, bound by name from its positional tuple.
///
/// Fields keep the values exactly as the warehouse sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    /// Workflow that owns the call.
    pub workflow_id: Value,
    /// JSON-encoded `{uri, method, timeout}`.
    pub request_config: Value,
    /// JSON-encoded auth block.
    pub auth: Value,
    /// JSON-encoded header mapping.
    pub headers: Value,
    /// JSON-encoded query-string mapping.
    pub query_string: Value,
    /// JSON-encoded request body.
    pub body: Value,
    /// Result table receiving the response row.
    pub result_table: Value,
    /// Task queue that should carry the execution message.
    pub queue_name: Value,
}

impl CallDescriptor {
    /// Binds one positional argument tuple to named slots.
    pub fn from_positional(arguments: &Value) -> Result<Self, DescriptorError> {
        let Value::Array(arguments) = arguments else {
            return Err(DescriptorError::MalformedArguments(
                json_kind(arguments).to_owned(),
            ));
        };

        if arguments.len() < CALL_ARGUMENT_ORDER.len() {
            return Err(DescriptorError::MissingArguments {
                expected: CALL_ARGUMENT_ORDER.len(),
                actual: arguments.len(),
            });
        }

        let mut slots = arguments.iter().cloned();
        let mut next = || slots.next().unwrap_or(Value::Null);

        Ok(Self {
            workflow_id: next(),
            request_config: next(),
            auth: next(),
            headers: next(),
            query_string: next(),
            body: next(),
            result_table: next(),
            queue_name: next(),
        })
    }

    /// Returns the result table name.
    pub fn result_table(&self) -> Result<&str, DescriptorError> {
        self.result_table
            .as_str()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DescriptorError::missing("result_table"))
    }

    /// Returns the task queue name.
    pub fn queue_name(&self) -> Result<&str, DescriptorError> {
        self.queue_name
            .as_str()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DescriptorError::missing("queue_name"))
    }
}

/// Task-queue payload consumed by the execution phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMessage {
    /// Workflow that owns the call.
    #[serde(default)]
    pub workflow_id: Value,
    /// Decoded `{uri, method, timeout}`.
    #[serde(default)]
    pub request_config: Value,
    /// Decoded header mapping.
    #[serde(default)]
    pub headers: Value,
    /// Wire-format query string.
    #[serde(default)]
    pub query_string: Value,
    /// Decoded auth block.
    #[serde(default)]
    pub auth: Value,
    /// Decoded request body.
    #[serde(default)]
    pub body: Value,
    /// Result (or log) table name.
    #[serde(default)]
    pub result_table: Value,
    /// Always [`RequestSource::Execution`].
    pub source: RequestSource,
}

impl ExecutionMessage {
    /// Repackages a call descriptor for the execution phase.
    ///
    /// JSON-encoded fields are decoded when possible and carried verbatim
    /// otherwise; the query string is re-encoded to wire format. The workflow
    /// id and result table are identifiers and are never decoded.
    #[must_use]
    pub fn from_call(call: &CallDescriptor) -> Self {
        Self {
            workflow_id: call.workflow_id.clone(),
            request_config: decode_lenient(&call.request_config),
            headers: decode_lenient(&call.headers),
            query_string: Value::String(encode_query_string(&decode_lenient(
                &call.query_string,
            ))),
            auth: decode_lenient(&call.auth),
            body: decode_lenient(&call.body),
            result_table: call.result_table.clone(),
            source: RequestSource::Execution,
        }
    }

    /// Serializes the message for task-queue submission.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
