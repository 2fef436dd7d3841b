use ai_llm_service::AiLlmError;
use answer_engine::EngineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_store::RagError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("ingestion is not configured on this server")]
    IngestUnavailable,

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::IngestUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Http { status, .. } => *status,

            // startup-only
            AppError::Engine(_)
            | AppError::Llm(_)
            | AppError::Bind { .. }
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Engine(_) => "ENGINE_ERROR",
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::IngestUnavailable => "INGEST_UNAVAILABLE",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Maps store failures during ingestion onto precise HTTP statuses.
impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let (status, code) = match &err {
            RagError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (StatusCode::NOT_FOUND, "INPUT_NOT_FOUND")
            }
            RagError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            RagError::Json(_) | RagError::Parse(_) => (StatusCode::BAD_REQUEST, "INVALID_RECORDS"),
            RagError::VectorSizeMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VECTOR_SIZE_MISMATCH")
            }
            RagError::MissingEmbedding => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_EMBEDDING"),
            RagError::Embedding(_) => (StatusCode::BAD_GATEWAY, "EMBEDDER_UNAVAILABLE"),
            RagError::NotConnected(_) | RagError::Qdrant(_) => {
                (StatusCode::BAD_GATEWAY, "INDEX_UNAVAILABLE")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INGEST_FAILED"),
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}
