use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESULT_TABLE_MARKER: &str = "tbl_result";
const LOG_TABLE_MARKER: &str = "tbl_process_log";

/// Derives the process-log table paired with a result table.
#[must_use]
pub fn log_table_for(result_table: &str) -> String {
    result_table.replace(RESULT_TABLE_MARKER, LOG_TABLE_MARKER)
}

/// Derives the result table paired with a process-log table.
#[must_use]
pub fn result_table_for(log_table: &str) -> String {
    log_table.replace(LOG_TABLE_MARKER, RESULT_TABLE_MARKER)
}

/// The result/log table pair for one call.
///
/// The pair is linked only by the `tbl_result` / `tbl_process_log` naming
/// convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryTables {
    result_table: String,
    log_table: String,
}

impl TelemetryTables {
    /// Builds the pair from either member's name.
    #[must_use]
    pub fn from_result_table(name: &str) -> Self {
        let result_table = result_table_for(name);
        let log_table = log_table_for(result_table.as_str());

        Self {
            result_table,
            log_table,
        }
    }

    /// Returns the result table name.
    #[must_use]
    pub fn result_table(&self) -> &str {
        self.result_table.as_str()
    }

    /// Returns the process-log table name.
    #[must_use]
    pub fn log_table(&self) -> &str {
        self.log_table.as_str()
    }

    /// Returns the table pattern shared by both names, for log output.
    #[must_use]
    pub fn display_pattern(&self) -> String {
        self.result_table.replace(RESULT_TABLE_MARKER, "*")
    }
}

/// Condensed outcome row written at enqueue time and at execution completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessLogRow {
    /// Headers as received.
    pub headers: Option<String>,
    /// Query string as received.
    pub query_string: Option<String>,
    /// Body as received.
    pub body: Option<String>,
    /// JSON-encoded outcome object.
    pub result: String,
    /// Row creation time.
    pub exec_time: DateTime<Utc>,
}

/// Request echo stored in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRequest {
    /// Target URI.
    pub uri: String,
    /// Method as configured.
    pub method: String,
    /// Auth type label, empty without auth.
    pub auth_type: String,
    /// Wire-format query string.
    pub query_string: String,
    /// Body rendered as text.
    pub body: Option<String>,
}

/// Response echo stored in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultResponse {
    /// External (or locally assigned) status code.
    pub status_code: u16,
    /// JSON-encoded response headers.
    pub headers: String,
    /// Raw response body or failure text.
    pub body: String,
}

/// Full request/response row written for every completed execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Request echo.
    pub request: ResultRequest,
    /// Time the row was assembled.
    pub request_time: DateTime<Utc>,
    /// Seconds spent on the external call.
    pub elapsed_time: f64,
    /// Response echo.
    pub response: ResultResponse,
}

/// One append-only telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRow {
    /// Process-log row.
    ProcessLog(ProcessLogRow),
    /// Result row.
    Result(ResultRow),
}

/// Outcome recorded in a process-log row's `result` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Call accepted by the task queue.
    Queued,
    /// Call could not be queued.
    QueueFailed(String),
    /// External call finished with a success status.
    Succeeded {
        /// Status code.
        status_code: u16,
    },
    /// External call, auth or configuration failed.
    Failed {
        /// Status code.
        status_code: u16,
        /// Failure text.
        error_message: String,
    },
}

impl ProcessOutcome {
    /// Returns the outcome as the JSON object stored in `result`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Queued => serde_json::json!({"response": "Request added to the queue."}),
            Self::QueueFailed(detail) => {
                serde_json::json!({"error": format!("Error adding request to the queue: {detail}")})
            }
            Self::Succeeded { status_code } => serde_json::json!({"status_code": status_code}),
            Self::Failed {
                status_code,
                error_message,
            } => serde_json::json!({
                "status_code": status_code,
                "error_message": error_message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::{ProcessOutcome, TelemetryTables, log_table_for, result_table_for};

    #[test]
    fn log_table_is_derived_by_substitution() {
        assert_eq!(log_table_for("tbl_result_X"), "tbl_process_log_X");
        assert_eq!(result_table_for("tbl_process_log_X"), "tbl_result_X");
    }

    #[test]
    fn table_pair_accepts_either_name() {
        let from_result = TelemetryTables::from_result_table("ds.tbl_result_orders");
        let from_log = TelemetryTables::from_result_table("ds.tbl_process_log_orders");

        assert_eq!(from_result, from_log);
        assert_eq!(from_result.log_table(), "ds.tbl_process_log_orders");
        assert_eq!(from_result.display_pattern(), "ds.*_orders");
    }

    #[test]
    fn outcomes_render_expected_objects() {
        assert_eq!(
            ProcessOutcome::Queued.to_json(),
            json!({"response": "Request added to the queue."})
        );
        assert_eq!(
            ProcessOutcome::Failed {
                status_code: 404,
                error_message: "missing".to_owned()
            }
            .to_json(),
            json!({"status_code": 404, "error_message": "missing"})
        );
    }

    proptest! {
        #[test]
        fn substitution_is_invertible(suffix in "[a-z0-9]{0,16}", prefix in "([a-z]{1,8}\\.)?") {
            let result_table = format!("{prefix}tbl_result_{suffix}");
            let log_table = log_table_for(&result_table);

            prop_assert_eq!(log_table.clone(), format!("{prefix}tbl_process_log_{suffix}"));
            prop_assert_eq!(result_table_for(&log_table), result_table);
        }
    }
}
