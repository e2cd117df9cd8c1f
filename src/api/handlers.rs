use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::metrics::{post_connection_metrics, validate_report};
use crate::models::ConnectionRow;
use crate::storage::InsertableTable;

pub struct AppState {
    pub table: Arc<dyn InsertableTable<ConnectionRow>>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub rows_inserted: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}

/// Accept an hourly connection metrics report
pub async fn post_connections(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<InsertResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!("Unreadable connection metrics request: {}", rejection);
        error(rejection.status(), rejection.body_text())
    })?;

    let report = validate_report(&payload).map_err(|rejection| {
        tracing::warn!("Rejected connection metrics report: {}", rejection);
        error(
            StatusCode::BAD_REQUEST,
            format!("Invalid connection metrics report: {}", rejection),
        )
    })?;

    match post_connection_metrics(state.table.as_ref(), &report).await {
        Ok(rows_inserted) => Ok(Json(InsertResponse { rows_inserted })),
        Err(e) => {
            tracing::error!(
                server_id = %report.server_id,
                "Failed to insert connection metrics: {}",
                e
            );
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to insert connection metrics".to_string(),
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
