//! Typed errors for the answer-engine crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Question was empty or whitespace only. No pipeline work was done.
    #[error("no question given")]
    EmptyQuestion,

    /// Invalid engine configuration (startup only).
    #[error("invalid engine config: {0}")]
    Config(String),

    /// Domain catalog could not be read or parsed.
    #[error("domain catalog error: {0}")]
    Catalog(String),

    /// Errors from the underlying rag-store crate (startup wiring).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Generic IO (catalog file, quality log).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization issues.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single call to the generative service.
///
/// Every variant routes the synthesizer to its template fallback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Connection refused, DNS, TLS or any other transport failure.
    #[error("generative service unreachable: {0}")]
    Unreachable(String),

    /// No answer within the configured time.
    #[error("generative service timed out")]
    Timeout,

    /// Non-200 answer.
    #[error("generative service returned HTTP {0}")]
    HttpStatus(u16),

    /// Body could not be decoded.
    #[error("generative service response undecodable: {0}")]
    Decode(String),
}

/// Why the index stage could not deliver passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFailure {
    NotConnected,
    CollectionMissing,
    EmptyCollection,
    QueryFailed,
}

impl From<&rag_store::RagError> for IndexFailure {
    fn from(e: &rag_store::RagError) -> Self {
        use rag_store::RagError;
        match e {
            RagError::NotConnected(_) => IndexFailure::NotConnected,
            RagError::CollectionMissing(_) => IndexFailure::CollectionMissing,
            _ => IndexFailure::QueryFailed,
        }
    }
}
