use std::sync::Arc;

use axum::{Json, extract::State};

use crate::core::app_state::AppState;

/// Handler: GET /sources: distinct statute names in the index.
pub async fn sources(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.sources().await)
}
