use apiconnector_core::AppResult;
use apiconnector_domain::TelemetryRow;
use async_trait::async_trait;

/// Append-only warehouse table writer.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Appends one row to the named table.
    async fn append_row(&self, table: &str, row: TelemetryRow) -> AppResult<()>;
}
