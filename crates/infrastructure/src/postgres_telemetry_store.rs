use apiconnector_application::TelemetryStore;
use apiconnector_core::{AppError, AppResult};
use apiconnector_domain::{ProcessLogRow, ResultRow, TelemetryRow};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

/// PostgreSQL-backed append-only telemetry tables.
///
/// Table names arrive with each call, so they are validated and quoted
/// before being spliced into the statement.
#[derive(Clone)]
pub struct PostgresTelemetryStore {
    pool: PgPool,
}

impl PostgresTelemetryStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn append_process_log(&self, table: &str, row: ProcessLogRow) -> AppResult<()> {
        let statement = format!(
            r#"
            INSERT INTO {table} (
                headers,
                query_string,
                body,
                result,
                exec_time
            )
            VALUES ($1, $2, $3, $4, $5)
            "#
        );

        sqlx::query(statement.as_str())
            .bind(row.headers)
            .bind(row.query_string)
            .bind(row.body)
            .bind(row.result)
            .bind(row.exec_time)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to append process log row: {error}"))
            })?;

        Ok(())
    }

    async fn append_result(&self, table: &str, row: ResultRow) -> AppResult<()> {
        let statement = format!(
            r#"
            INSERT INTO {table} (
                request,
                request_time,
                elapsed_time,
                response
            )
            VALUES ($1, $2, $3, $4)
            "#
        );

        sqlx::query(statement.as_str())
            .bind(Json(row.request))
            .bind(row.request_time)
            .bind(row.elapsed_time)
            .bind(Json(row.response))
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to append result row: {error}")))?;

        Ok(())
    }
}

/// Validates `table` or `schema.table` and returns it double-quoted.
fn quoted_table_name(table: &str) -> AppResult<String> {
    let parts: Vec<&str> = table.split('.').collect();
    let valid = parts.len() <= 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|character| character.is_ascii_alphanumeric() || character == '_')
        });

    if !valid {
        return Err(AppError::Validation(format!(
            "invalid telemetry table name '{table}'"
        )));
    }

    Ok(parts
        .iter()
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

#[async_trait]
impl TelemetryStore for PostgresTelemetryStore {
    async fn append_row(&self, table: &str, row: TelemetryRow) -> AppResult<()> {
        let table = quoted_table_name(table)?;

        match row {
            TelemetryRow::ProcessLog(row) => self.append_process_log(table.as_str(), row).await,
            TelemetryRow::Result(row) => self.append_result(table.as_str(), row).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::quoted_table_name;

    #[test]
    fn schema_qualified_names_are_quoted_per_part() {
        assert_eq!(
            quoted_table_name("analytics.tbl_result_items").ok(),
            Some("\"analytics\".\"tbl_result_items\"".to_owned())
        );
        assert_eq!(
            quoted_table_name("tbl_process_log_items").ok(),
            Some("\"tbl_process_log_items\"".to_owned())
        );
    }

    #[test]
    fn injection_attempts_are_rejected() {
        assert!(quoted_table_name("tbl_result; DROP TABLE users").is_err());
        assert!(quoted_table_name("a.b.c").is_err());
        assert!(quoted_table_name("analytics.").is_err());
        assert!(quoted_table_name("\"quoted\"").is_err());
        assert!(quoted_table_name("").is_err());
    }
}
