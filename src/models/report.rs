//! Validated hourly connection metrics reports.
//!
//! Values of these types are only produced by
//! [`validate_report`](crate::metrics::validate_report); building one by
//! hand skips the boundary checks the row mapper relies on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Number;

/// An hourly usage report submitted by a single server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyConnectionMetricsReport {
    /// Identifier of the reporting server (never empty)
    pub server_id: String,

    /// Start of the reporting window, truncated to whole milliseconds
    #[serde(rename = "startUtcMs", with = "chrono::serde::ts_milliseconds")]
    pub start_utc: DateTime<Utc>,

    /// End of the reporting window, always after `start_utc`
    #[serde(rename = "endUtcMs", with = "chrono::serde::ts_milliseconds")]
    pub end_utc: DateTime<Utc>,

    /// Per-user usage, in the order the server sent it (never empty)
    pub user_reports: Vec<UserReport>,
}

/// Usage attributed to one user within a report window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
    /// Bytes moved during the window, kept in the sender's number form
    pub bytes_transferred: Number,

    /// Seconds the tunnel was up; `None` when the sender left it unset or falsy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_time_sec: Option<Number>,

    /// Countries the user connected from (at least one)
    pub countries: Vec<String>,
}
