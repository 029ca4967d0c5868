use std::sync::Arc;

use apiconnector_domain::TelemetryRow;
use tracing::{debug, warn};

use crate::connector_ports::TelemetryStore;

/// Best-effort telemetry writer that never propagates store failures.
#[derive(Clone)]
pub struct TelemetryWriter {
    store: Arc<dyn TelemetryStore>,
}

impl TelemetryWriter {
    /// Creates a writer over a telemetry store.
    #[must_use]
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Appends one row and reports whether delivery was confirmed.
    ///
    /// A `false` return means "delivery unconfirmed", never call failure.
    pub async fn write(&self, table: &str, row: TelemetryRow) -> bool {
        debug!(table = %table, "writing telemetry row");

        match self.store.append_row(table, row).await {
            Ok(()) => true,
            Err(error) => {
                warn!(table = %table, error = %error, "failed to write telemetry row");
                false
            }
        }
    }
}
