//! Connection metrics ingestion
//!
//! Untrusted reports are checked by [`validate`], flattened by [`rows`] and
//! handed to an [`InsertableTable`] as a single batch.

pub mod rows;
pub mod validate;

pub use rows::report_to_rows;
pub use validate::{is_valid_report, validate_report, Rejection, UserReportRejection};

use tracing::debug;

use crate::models::{ConnectionRow, HourlyConnectionMetricsReport};
use crate::storage::{InsertableTable, SinkResult};

/// Writes every row of `report` to `table` in one insert.
///
/// Sink failures are returned as-is; nothing is retried.
pub async fn post_connection_metrics(
    table: &dyn InsertableTable<ConnectionRow>,
    report: &HourlyConnectionMetricsReport,
) -> SinkResult<usize> {
    let rows = report_to_rows(report);
    let count = rows.len();
    table.insert(rows).await?;
    debug!(
        server_id = %report.server_id,
        rows = count,
        "Inserted connection metrics"
    );
    Ok(count)
}
