use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::json_text::{present, present_str, to_text};
use crate::{AuthDescriptor, DescriptorError, ExecutionMessage, HttpMethod, TelemetryTables};

/// Timeout applied when the call configuration names none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Target of the external call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    uri: String,
    method: String,
    timeout: Duration,
}

impl RequestConfig {
    /// Reads `{uri, method?, timeout?}`; `uri` is required.
    pub fn from_value(value: &Value) -> Result<Self, DescriptorError> {
        let fields = value
            .as_object()
            .ok_or_else(|| DescriptorError::missing("request_config"))?;
        let uri = present_str(fields, "uri")
            .ok_or_else(|| DescriptorError::missing("uri"))?
            .to_owned();
        let method = present_str(fields, "method")
            .unwrap_or(HttpMethod::default().as_str())
            .to_owned();
        let timeout = present(fields, "timeout")
            .and_then(Value::as_f64)
            .filter(|seconds| *seconds > 0.0)
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            uri,
            method,
            timeout,
        })
    }

    /// Returns the target URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        self.uri.as_str()
    }

    /// Returns the method exactly as configured.
    #[must_use]
    pub fn method_label(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the method if it is one of the supported verbs.
    pub fn method(&self) -> Result<HttpMethod, DescriptorError> {
        HttpMethod::from_str(self.method.as_str())
    }

    /// Returns the hard upper bound for the external call.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Validated view of an execution message.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Workflow identifier used for topic routing.
    pub workflow_id: Option<String>,
    /// Target URI, method and timeout.
    pub request_config: RequestConfig,
    /// Auth block, when configured.
    pub auth: Option<AuthDescriptor>,
    /// Outbound headers.
    pub headers: Vec<(String, String)>,
    /// Wire-format query string.
    pub query_string: String,
    /// Request body as decoded at enqueue time.
    pub body: Value,
    /// Telemetry tables for this call.
    pub tables: TelemetryTables,
    raw_headers: Value,
}

impl ExecutionRequest {
    /// Validates the structural fields every execution path depends on.
    pub fn from_message(message: &ExecutionMessage) -> Result<Self, DescriptorError> {
        let result_table = message
            .result_table
            .as_str()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DescriptorError::missing("result_table"))?;
        let request_config = RequestConfig::from_value(&message.request_config)?;

        Ok(Self {
            workflow_id: to_text(&message.workflow_id).filter(|id| !id.is_empty()),
            request_config,
            auth: AuthDescriptor::from_value(&message.auth),
            headers: header_pairs(&message.headers),
            query_string: to_text(&message.query_string).unwrap_or_default(),
            body: message.body.clone(),
            tables: TelemetryTables::from_result_table(result_table),
            raw_headers: message.headers.clone(),
        })
    }

    /// Returns the headers rendered for a text telemetry column.
    #[must_use]
    pub fn headers_text(&self) -> Option<String> {
        to_text(&self.raw_headers)
    }

    /// Returns the body rendered for a text telemetry column.
    #[must_use]
    pub fn body_text(&self) -> Option<String> {
        to_text(&self.body)
    }
}

fn header_pairs(headers: &Value) -> Vec<(String, String)> {
    headers
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(name, value)| to_text(value).map(|value| (name.clone(), value)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::{DEFAULT_TIMEOUT, ExecutionRequest, RequestConfig};
    use crate::{DescriptorError, ExecutionMessage, HttpMethod, RequestSource};

    fn message(request_config: serde_json::Value) -> ExecutionMessage {
        ExecutionMessage {
            workflow_id: json!("orders_sync"),
            request_config,
            headers: json!({"Accept": "application/json", "X-Page": 2}),
            query_string: json!("a=1"),
            auth: json!(null),
            body: json!({"id": 7}),
            result_table: json!("analytics.tbl_process_log_orders"),
            source: RequestSource::Execution,
        }
    }

    #[test]
    fn request_config_applies_defaults() {
        let config = RequestConfig::from_value(&json!({"uri": "https://x/y", "method": ""}));
        let Ok(config) = config else {
            panic!("config should parse");
        };

        assert_eq!(config.method(), Ok(HttpMethod::Post));
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn request_config_falls_back_when_timeout_is_out_of_range() {
        for timeout in [json!(1e20), json!(-3), json!(0)] {
            let config = RequestConfig::from_value(&json!({"uri": "https://x/y", "timeout": timeout}));
            let Ok(config) = config else {
                panic!("config should parse");
            };

            assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        }
    }

    #[test]
    fn request_config_keeps_unsupported_method_for_later_rejection() {
        let config = RequestConfig::from_value(&json!({
            "uri": "https://x/y",
            "method": "PATCH",
            "timeout": 2.5
        }));
        let Ok(config) = config else {
            panic!("config should parse");
        };

        assert_eq!(config.method_label(), "PATCH");
        assert!(config.method().is_err());
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn request_config_requires_uri() {
        assert_eq!(
            RequestConfig::from_value(&json!({"method": "GET"})),
            Err(DescriptorError::MissingProperty("uri".to_owned()))
        );
    }

    #[test]
    fn execution_request_normalizes_tables_and_headers() {
        let request =
            ExecutionRequest::from_message(&message(json!({"uri": "https://x/y"})));
        let Ok(request) = request else {
            panic!("message should validate");
        };

        assert_eq!(request.tables.result_table(), "analytics.tbl_result_orders");
        assert_eq!(request.tables.log_table(), "analytics.tbl_process_log_orders");
        assert!(request.headers.contains(&("X-Page".to_owned(), "2".to_owned())));
        assert_eq!(request.workflow_id.as_deref(), Some("orders_sync"));
    }

    #[test]
    fn execution_request_requires_result_table() {
        let mut message = message(json!({"uri": "https://x/y"}));
        message.result_table = json!(null);

        assert!(ExecutionRequest::from_message(&message).is_err());
    }
}
