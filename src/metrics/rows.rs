//! Flattening of validated reports into sink rows.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Number;

use crate::models::{ConnectionRow, HourlyConnectionMetricsReport};

/// Expands `report` into one row per user report, preserving input order.
///
/// Every row shares the report's rendered start and end timestamps.
pub fn report_to_rows(report: &HourlyConnectionMetricsReport) -> Vec<ConnectionRow> {
    let start_timestamp = iso_timestamp(&report.start_utc);
    let end_timestamp = iso_timestamp(&report.end_utc);

    report
        .user_reports
        .iter()
        .map(|user_report| ConnectionRow {
            server_id: report.server_id.clone(),
            start_timestamp: start_timestamp.clone(),
            end_timestamp: end_timestamp.clone(),
            bytes_transferred: user_report.bytes_transferred.clone(),
            tunnel_time_sec: user_report
                .tunnel_time_sec
                .clone()
                .filter(is_nonzero),
            countries: user_report.countries.clone(),
        })
        .collect()
}

/// Renders `2020-01-01T00:00:00.000Z`.
fn iso_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_nonzero(n: &Number) -> bool {
    n.as_f64().is_some_and(|f| f != 0.0)
}
