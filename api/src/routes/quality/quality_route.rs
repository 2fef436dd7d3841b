use std::sync::Arc;

use answer_engine::quality::{QualityReport, analyze};
use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
};

/// Handler: GET /quality: report over the answer-quality log.
pub async fn quality(State(state): State<Arc<AppState>>) -> AppResult<ApiResponse<QualityReport>> {
    let Some(log) = state.engine.quality_log() else {
        return Err(AppError::Http {
            status: StatusCode::NOT_FOUND,
            code: "QUALITY_LOG_DISABLED",
            message: "answer-quality logging is disabled".into(),
        });
    };

    let entries = log.load().await.map_err(|e| {
        warn!(path = %log.path().display(), error = %e, "quality log unreadable");
        AppError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "QUALITY_LOG_UNREADABLE",
            message: e.to_string(),
        }
    })?;
    Ok(ApiResponse::success(analyze(&entries)))
}
