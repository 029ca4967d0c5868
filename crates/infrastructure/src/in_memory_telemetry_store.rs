use apiconnector_application::TelemetryStore;
use apiconnector_core::AppResult;
use apiconnector_domain::TelemetryRow;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// In-memory telemetry store for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryTelemetryStore {
    rows: Mutex<Vec<(String, TelemetryRow)>>,
}

impl InMemoryTelemetryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every row appended to `table`, oldest first.
    pub async fn rows_for(&self, table: &str) -> Vec<TelemetryRow> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|(name, _)| name == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

#[async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn append_row(&self, table: &str, row: TelemetryRow) -> AppResult<()> {
        self.rows.lock().await.push((table.to_owned(), row));
        Ok(())
    }
}
