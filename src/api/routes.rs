use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::models::ConnectionRow;
use crate::storage::InsertableTable;

use super::handlers::{health_check, post_connections, AppState};

pub fn create_api_router(
    table: Arc<dyn InsertableTable<ConnectionRow>>,
    max_report_bytes: usize,
) -> Router {
    let state = Arc::new(AppState { table });

    Router::new()
        .route("/health", get(health_check))
        .route("/connections", post(post_connections))
        .layer(DefaultBodyLimit::max(max_report_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
