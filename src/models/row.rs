use serde::Serialize;
use serde_json::Number;

/// Flat row handed to the analytics sink, one per [`UserReport`](super::UserReport).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRow {
    pub server_id: String,

    /// ISO-8601 rendering of the report start, e.g. `2020-01-01T00:00:00.000Z`
    pub start_timestamp: String,

    /// ISO-8601 rendering of the report end
    pub end_timestamp: String,

    pub bytes_transferred: Number,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_time_sec: Option<Number>,

    pub countries: Vec<String>,
}
