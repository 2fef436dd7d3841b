//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
///
/// Callers that need to tell infrastructure states apart match on
/// [`RagError::NotConnected`], [`RagError::CollectionMissing`] and
/// [`RagError::QueryFailed`]; an empty collection is not an error
/// (`count() == 0`).
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record dump could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Missing embedding and no provider available.
    #[error("missing embedding and no provider supplied")]
    MissingEmbedding,

    /// The vector index cannot be reached.
    #[error("vector index not connected: {0}")]
    NotConnected(String),

    /// The configured collection does not exist.
    #[error("collection '{0}' does not exist")]
    CollectionMissing(String),

    /// The similarity query itself failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Other Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// The embedding backend failed or is unavailable.
    #[error("embedding error: {0}")]
    Embedding(String),
}

impl From<ai_llm_service::AiLlmError> for RagError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        RagError::Embedding(e.to_string())
    }
}
