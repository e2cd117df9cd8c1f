//! Boundary checks for untrusted connection metrics reports.
//!
//! Reports arrive as arbitrary JSON. Each check below inspects one part of
//! the payload and either narrows it into typed data or names the reason it
//! was refused. Checks run in a fixed order and stop at the first failure.
//!
//! Truthiness follows the reporting clients' JavaScript rules: `null`,
//! `false`, `0` and `""` all count as "not set". As a consequence a
//! `startUtcMs` of `0` is refused as missing rather than as a bad window.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::models::{HourlyConnectionMetricsReport, UserReport};

const SERVER_ID: &str = "serverId";
const START_UTC_MS: &str = "startUtcMs";
const END_UTC_MS: &str = "endUtcMs";
const USER_REPORTS: &str = "userReports";

const REQUIRED_FIELDS: [&str; 4] = [SERVER_ID, START_UTC_MS, END_UTC_MS, USER_REPORTS];

const MIN_BYTES_TRANSFERRED: f64 = 0.0;
/// 1 TiB in an hour.
pub const MAX_BYTES_TRANSFERRED: f64 = 1_099_511_627_776.0;

/// 0000-01-01T00:00:00.000Z
const MIN_RENDERABLE_MS: i64 = -62_167_219_200_000;
/// 9999-12-31T23:59:59.999Z
const MAX_RENDERABLE_MS: i64 = 253_402_300_799_999;

/// Why a report was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("report is empty")]
    EmptyReport,
    #[error("required field `{0}` is missing or unset")]
    MissingField(&'static str),
    #[error("`serverId` is not a string")]
    ServerIdNotString,
    #[error("`{0}` is not a number")]
    TimestampNotNumber(&'static str),
    #[error("`startUtcMs` is not before `endUtcMs`")]
    StartNotBeforeEnd,
    #[error("`{0}` is outside the renderable date range")]
    TimestampOutOfRange(&'static str),
    #[error("`userReports` is not an array")]
    UserReportsNotArray,
    #[error("`userReports` is empty")]
    NoUserReports,
    #[error("user report {index}: {reason}")]
    UserReport {
        index: usize,
        reason: UserReportRejection,
    },
}

/// Why a single entry of `userReports` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserReportRejection {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("`bytesTransferred` is not a number")]
    BytesNotNumber,
    #[error("`bytesTransferred` is outside [0, 2^40]")]
    BytesOutOfRange,
    #[error("`tunnelTimeSec` is not a number")]
    TunnelTimeNotNumber,
    #[error("`tunnelTimeSec` is negative")]
    NegativeTunnelTime,
    #[error("`countries` is not an array")]
    CountriesNotArray,
    #[error("`countries` is empty")]
    NoCountries,
    #[error("country {0} is not a string")]
    CountryNotString(usize),
}

/// Returns true iff `candidate` is a valid hourly connection metrics report.
pub fn is_valid_report(candidate: &Value) -> bool {
    validate_report(candidate).is_ok()
}

/// Checks `candidate` and, on success, returns the typed report.
pub fn validate_report(candidate: &Value) -> Result<HourlyConnectionMetricsReport, Rejection> {
    if !is_truthy(candidate) {
        return Err(Rejection::EmptyReport);
    }
    check_required_fields(candidate)?;
    let server_id = check_server_id(candidate)?;
    let (start_utc, end_utc) = check_time_window(candidate)?;
    let user_reports = check_user_reports(candidate)?;

    Ok(HourlyConnectionMetricsReport {
        server_id,
        start_utc,
        end_utc,
        user_reports,
    })
}

/// JavaScript truthiness over JSON values.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn check_required_fields(candidate: &Value) -> Result<(), Rejection> {
    for field in REQUIRED_FIELDS {
        if !candidate.get(field).is_some_and(is_truthy) {
            return Err(Rejection::MissingField(field));
        }
    }
    Ok(())
}

pub(crate) fn check_server_id(candidate: &Value) -> Result<String, Rejection> {
    match candidate.get(SERVER_ID) {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(Rejection::ServerIdNotString),
    }
}

pub(crate) fn check_time_window(
    candidate: &Value,
) -> Result<(DateTime<Utc>, DateTime<Utc>), Rejection> {
    let start = number_field(candidate, START_UTC_MS)?;
    let end = number_field(candidate, END_UTC_MS)?;
    if start >= end {
        return Err(Rejection::StartNotBeforeEnd);
    }
    Ok((
        to_datetime(start, START_UTC_MS)?,
        to_datetime(end, END_UTC_MS)?,
    ))
}

fn number_field(candidate: &Value, field: &'static str) -> Result<f64, Rejection> {
    candidate
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(Rejection::TimestampNotNumber(field))
}

/// Truncates toward zero to whole milliseconds, as a JavaScript `Date` does.
fn to_datetime(ms: f64, field: &'static str) -> Result<DateTime<Utc>, Rejection> {
    let ms = ms.trunc();
    if !((MIN_RENDERABLE_MS as f64)..=(MAX_RENDERABLE_MS as f64)).contains(&ms) {
        return Err(Rejection::TimestampOutOfRange(field));
    }
    DateTime::from_timestamp_millis(ms as i64).ok_or(Rejection::TimestampOutOfRange(field))
}

pub(crate) fn check_user_reports(candidate: &Value) -> Result<Vec<UserReport>, Rejection> {
    let entries = match candidate.get(USER_REPORTS) {
        Some(Value::Array(entries)) => entries,
        _ => return Err(Rejection::UserReportsNotArray),
    };
    if entries.is_empty() {
        return Err(Rejection::NoUserReports);
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            check_user_report(entry).map_err(|reason| Rejection::UserReport { index, reason })
        })
        .collect()
}

pub(crate) fn check_user_report(entry: &Value) -> Result<UserReport, UserReportRejection> {
    if !entry.is_object() {
        return Err(UserReportRejection::NotAnObject);
    }

    Ok(UserReport {
        bytes_transferred: check_bytes_transferred(entry)?,
        tunnel_time_sec: check_tunnel_time(entry)?,
        countries: check_countries(entry)?,
    })
}

fn check_bytes_transferred(entry: &Value) -> Result<Number, UserReportRejection> {
    let Some(Value::Number(bytes)) = entry.get("bytesTransferred") else {
        return Err(UserReportRejection::BytesNotNumber);
    };
    let in_range = bytes
        .as_f64()
        .is_some_and(|b| (MIN_BYTES_TRANSFERRED..=MAX_BYTES_TRANSFERRED).contains(&b));
    if !in_range {
        return Err(UserReportRejection::BytesOutOfRange);
    }
    Ok(bytes.clone())
}

/// An unset or falsy tunnel time is accepted and dropped.
fn check_tunnel_time(entry: &Value) -> Result<Option<Number>, UserReportRejection> {
    match entry.get("tunnelTimeSec") {
        Some(value) if is_truthy(value) => match value {
            Value::Number(secs) if secs.as_f64().is_some_and(|s| s >= 0.0) => Ok(Some(secs.clone())),
            Value::Number(_) => Err(UserReportRejection::NegativeTunnelTime),
            _ => Err(UserReportRejection::TunnelTimeNotNumber),
        },
        _ => Ok(None),
    }
}

fn check_countries(entry: &Value) -> Result<Vec<String>, UserReportRejection> {
    let countries = match entry.get("countries") {
        None | Some(Value::Null) => return Err(UserReportRejection::NoCountries),
        Some(Value::Array(countries)) => countries,
        Some(_) => return Err(UserReportRejection::CountriesNotArray),
    };
    if countries.is_empty() {
        return Err(UserReportRejection::NoCountries);
    }

    countries
        .iter()
        .enumerate()
        .map(|(i, country)| match country {
            Value::String(code) => Ok(code.clone()),
            _ => Err(UserReportRejection::CountryNotString(i)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario_a() -> Value {
        json!({
            "serverId": "s1",
            "startUtcMs": 1000,
            "endUtcMs": 2000,
            "userReports": [{"bytesTransferred": 500, "countries": ["US"]}]
        })
    }

    fn with_user_report(user_report: Value) -> Value {
        let mut report = scenario_a();
        report["userReports"] = json!([user_report]);
        report
    }

    #[test]
    fn test_accepts_minimal_report() {
        let report = validate_report(&scenario_a()).unwrap();
        assert_eq!(report.server_id, "s1");
        assert_eq!(report.start_utc.timestamp_millis(), 1000);
        assert_eq!(report.end_utc.timestamp_millis(), 2000);
        assert_eq!(report.user_reports.len(), 1);
        assert_eq!(report.user_reports[0].bytes_transferred, Number::from(500));
        assert_eq!(report.user_reports[0].tunnel_time_sec, None);
        assert_eq!(report.user_reports[0].countries, vec!["US".to_string()]);
        assert!(is_valid_report(&scenario_a()));
    }

    #[test]
    fn test_rejects_falsy_candidate() {
        for candidate in [json!(null), json!(false), json!(0), json!("")] {
            assert_eq!(validate_report(&candidate), Err(Rejection::EmptyReport));
        }
    }

    #[test]
    fn test_rejects_non_object_candidate() {
        for candidate in [json!("report"), json!(42), json!([1, 2]), json!({})] {
            assert_eq!(
                validate_report(&candidate),
                Err(Rejection::MissingField(SERVER_ID))
            );
        }
    }

    #[test]
    fn test_rejects_missing_or_falsy_required_fields() {
        for field in REQUIRED_FIELDS {
            let mut report = scenario_a();
            report.as_object_mut().unwrap().remove(field);
            assert_eq!(
                check_required_fields(&report),
                Err(Rejection::MissingField(field))
            );

            report[field] = json!(null);
            assert!(!is_valid_report(&report), "{field} = null");
        }

        let mut report = scenario_a();
        report["serverId"] = json!("");
        assert_eq!(
            validate_report(&report),
            Err(Rejection::MissingField(SERVER_ID))
        );
    }

    #[test]
    fn test_zero_start_is_treated_as_missing() {
        let mut report = scenario_a();
        report["startUtcMs"] = json!(0);
        assert_eq!(
            validate_report(&report),
            Err(Rejection::MissingField(START_UTC_MS))
        );
    }

    #[test]
    fn test_rejects_non_string_server_id() {
        let mut report = scenario_a();
        report["serverId"] = json!(17);
        assert_eq!(check_server_id(&report), Err(Rejection::ServerIdNotString));
        assert!(!is_valid_report(&report));
    }

    #[test]
    fn test_rejects_non_numeric_timestamps() {
        let mut report = scenario_a();
        report["endUtcMs"] = json!("2000");
        assert_eq!(
            check_time_window(&report),
            Err(Rejection::TimestampNotNumber(END_UTC_MS))
        );
    }

    #[test]
    fn test_rejects_start_not_before_end() {
        let mut report = scenario_a();
        report["endUtcMs"] = json!(500);
        assert_eq!(validate_report(&report), Err(Rejection::StartNotBeforeEnd));

        report["endUtcMs"] = json!(1000);
        assert_eq!(validate_report(&report), Err(Rejection::StartNotBeforeEnd));
    }

    #[test]
    fn test_fractional_timestamps_truncate() {
        let mut report = scenario_a();
        report["startUtcMs"] = json!(1000.9);
        report["endUtcMs"] = json!(2000.2);
        let report = validate_report(&report).unwrap();
        assert_eq!(report.start_utc.timestamp_millis(), 1000);
        assert_eq!(report.end_utc.timestamp_millis(), 2000);
    }

    #[test]
    fn test_negative_start_is_accepted() {
        let mut report = scenario_a();
        report["startUtcMs"] = json!(-1000);
        assert!(is_valid_report(&report));
    }

    #[test]
    fn test_rejects_unrenderable_timestamps() {
        let mut report = scenario_a();
        report["endUtcMs"] = json!(MAX_RENDERABLE_MS + 1);
        assert_eq!(
            check_time_window(&report),
            Err(Rejection::TimestampOutOfRange(END_UTC_MS))
        );

        report["endUtcMs"] = json!(MAX_RENDERABLE_MS);
        assert!(check_time_window(&report).is_ok());

        report["startUtcMs"] = json!(1e300);
        report["endUtcMs"] = json!(1.5e300);
        assert_eq!(
            check_time_window(&report),
            Err(Rejection::TimestampOutOfRange(START_UTC_MS))
        );
    }

    #[test]
    fn test_rejects_empty_user_reports() {
        let mut report = scenario_a();
        report["userReports"] = json!([]);
        assert_eq!(validate_report(&report), Err(Rejection::NoUserReports));
    }

    #[test]
    fn test_rejects_non_array_user_reports() {
        let mut report = scenario_a();
        report["userReports"] = json!({"bytesTransferred": 1});
        assert_eq!(
            check_user_reports(&report),
            Err(Rejection::UserReportsNotArray)
        );
        report["userReports"] = json!("abc");
        assert_eq!(validate_report(&report), Err(Rejection::UserReportsNotArray));
    }

    #[test]
    fn test_bytes_transferred_bounds() {
        let accepted = [json!(0), json!(MAX_BYTES_TRANSFERRED as u64), json!(12.5)];
        for bytes in accepted {
            let report = with_user_report(json!({"bytesTransferred": bytes, "countries": ["US"]}));
            assert!(is_valid_report(&report), "bytesTransferred = {bytes}");
        }

        let rejected = [json!(-1), json!(MAX_BYTES_TRANSFERRED as u64 + 1), json!(-0.5)];
        for bytes in rejected {
            let entry = json!({"bytesTransferred": bytes, "countries": ["US"]});
            assert_eq!(
                check_user_report(&entry),
                Err(UserReportRejection::BytesOutOfRange),
                "bytesTransferred = {bytes}"
            );
        }
    }

    #[test]
    fn test_rejects_bytes_over_ceiling() {
        let report = with_user_report(json!({
            "bytesTransferred": 1_099_511_627_777u64,
            "countries": ["FR"]
        }));
        assert_eq!(
            validate_report(&report),
            Err(Rejection::UserReport {
                index: 0,
                reason: UserReportRejection::BytesOutOfRange,
            })
        );
    }

    #[test]
    fn test_rejects_missing_or_non_numeric_bytes() {
        for entry in [json!({"countries": ["US"]}), json!({"bytesTransferred": "5", "countries": ["US"]})] {
            assert_eq!(
                check_user_report(&entry),
                Err(UserReportRejection::BytesNotNumber)
            );
        }
    }

    #[test]
    fn test_tunnel_time() {
        let entry = json!({"bytesTransferred": 1, "tunnelTimeSec": 120, "countries": ["US"]});
        assert_eq!(
            check_user_report(&entry).unwrap().tunnel_time_sec,
            Some(Number::from(120))
        );

        for unset in [json!(null), json!(0), json!(""), json!(false)] {
            let entry = json!({"bytesTransferred": 1, "tunnelTimeSec": unset, "countries": ["US"]});
            assert_eq!(check_user_report(&entry).unwrap().tunnel_time_sec, None);
        }

        let entry = json!({"bytesTransferred": 1, "tunnelTimeSec": -5, "countries": ["US"]});
        assert_eq!(
            check_user_report(&entry),
            Err(UserReportRejection::NegativeTunnelTime)
        );

        let entry = json!({"bytesTransferred": 1, "tunnelTimeSec": "60", "countries": ["US"]});
        assert_eq!(
            check_user_report(&entry),
            Err(UserReportRejection::TunnelTimeNotNumber)
        );
    }

    #[test]
    fn test_countries() {
        let entry = json!({"bytesTransferred": 500, "countries": []});
        assert_eq!(check_user_report(&entry), Err(UserReportRejection::NoCountries));

        for entry in [
            json!({"bytesTransferred": 500}),
            json!({"bytesTransferred": 500, "countries": null}),
        ] {
            assert_eq!(check_user_report(&entry), Err(UserReportRejection::NoCountries));
        }

        let entry = json!({"bytesTransferred": 500, "countries": "US"});
        assert_eq!(
            check_user_report(&entry),
            Err(UserReportRejection::CountriesNotArray)
        );

        let entry = json!({"bytesTransferred": 500, "countries": ["US", 7]});
        assert_eq!(
            check_user_report(&entry),
            Err(UserReportRejection::CountryNotString(1))
        );
    }

    #[test]
    fn test_one_bad_user_report_rejects_all() {
        let mut report = scenario_a();
        report["userReports"] = json!([
            {"bytesTransferred": 1, "countries": ["US"]},
            {"bytesTransferred": 2, "countries": []},
        ]);
        assert_eq!(
            validate_report(&report),
            Err(Rejection::UserReport {
                index: 1,
                reason: UserReportRejection::NoCountries,
            })
        );
        assert_eq!(
            check_user_report(&json!(null)),
            Err(UserReportRejection::NotAnObject)
        );
    }

    #[test]
    fn test_validation_is_idempotent_and_leaves_input_untouched() {
        let candidate = scenario_a();
        let before = candidate.clone();
        assert_eq!(validate_report(&candidate), validate_report(&candidate));
        assert_eq!(candidate, before);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(-0.0)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(-1)));
    }
}
