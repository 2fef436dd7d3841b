//! POST /answer: answers one legal question.

use std::sync::Arc;

use answer_engine::{AnswerResult, Confidence, EngineError, messages};
use axum::{Json, extract::State, http::StatusCode};
use tracing::{error, instrument};

use crate::{core::app_state::AppState, routes::answer::answer_request::AnswerRequest};

/// Handler: POST /answer
///
/// Every outcome uses the answer shape; only the status code differs.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/answer \
///   -H 'content-type: application/json' \
///   -d '{"question":"Wie lange ist die tägliche Ruhezeit?"}'
/// ```
#[instrument(name = "answer_route", skip_all)]
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnswerRequest>,
) -> (StatusCode, Json<AnswerResult>) {
    match state.engine.answer(&body.question).await {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(EngineError::EmptyQuestion) => (
            StatusCode::BAD_REQUEST,
            Json(AnswerResult::bare(messages::EMPTY_QUESTION, Confidence::Error)),
        ),
        Err(e) => {
            error!(error = %e, "answer failed unexpectedly");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnswerResult::bare(messages::UNEXPECTED, Confidence::Error)),
            )
        }
    }
}
