use std::sync::Arc;

use answer_engine::HealthReport;
use axum::{Json, extract::State, http::StatusCode};

use crate::core::app_state::AppState;

/// Handler: GET /health: `500` while the index is unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let report = state.engine.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report))
}
