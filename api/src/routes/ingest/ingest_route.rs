//! POST /ingest: loads statute passages into the vector index.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use rag_store::{EmbeddingPolicy, IngestReport};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::ingest::ingest_request::{EmbeddingMode, IngestRequest},
};

/// Handler: POST /ingest
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/ingest \
///   -H 'content-type: application/json' \
///   -d '{"path":"data/gesetzestexte","recreate":true}'
/// ```
#[instrument(name = "ingest_route", skip_all, fields(path = %body.path.display()))]
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestRequest>,
) -> AppResult<ApiResponse<IngestReport>> {
    let ingestion = state.ingestion.as_ref().ok_or(AppError::IngestUnavailable)?;

    let meta = tokio::fs::metadata(&body.path).await.map_err(|e| AppError::Http {
        status: StatusCode::NOT_FOUND,
        code: "INPUT_NOT_FOUND",
        message: format!("{}: {e}", body.path.display()),
    })?;

    let embedder = ingestion.embedder.as_ref();
    let report = if meta.is_dir() {
        if body.embeddings == EmbeddingMode::PrecomputedOnly {
            return Err(AppError::BadRequest(
                "text directories have no precomputed embeddings".into(),
            ));
        }
        ingestion
            .store
            .ingest_text_dir(&body.path, EmbeddingPolicy::ProviderOnly(embedder), body.recreate)
            .await?
    } else {
        let policy = match body.embeddings {
            EmbeddingMode::PrecomputedOrEmbed => EmbeddingPolicy::PrecomputedOr(embedder),
            EmbeddingMode::AlwaysEmbed => EmbeddingPolicy::ProviderOnly(embedder),
            EmbeddingMode::PrecomputedOnly => EmbeddingPolicy::PrecomputedOnly,
        };
        ingestion
            .store
            .ingest_records_file(&body.path, policy, body.recreate)
            .await?
    };

    info!(
        records = report.records,
        upserted = report.upserted,
        "ingestion finished"
    );
    Ok(ApiResponse::success(report))
}
