use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Provider interface for embedding generation.
///
/// Async is required because real providers (Ollama) perform HTTP requests.
/// An `Err` means the embedder is unavailable for this call.
pub trait EmbeddingsProvider: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;

    /// Readiness check used by health reporting.
    ///
    /// The default implementation embeds a short probe text.
    fn probe<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move { self.embed("probe").await.is_ok() })
    }
}

/// Policy describing how to obtain embeddings during ingestion.
#[derive(Clone, Copy)]
pub enum EmbeddingPolicy<'a> {
    /// Use precomputed embeddings if available, otherwise generate via the provider.
    PrecomputedOr(&'a dyn EmbeddingsProvider),
    /// Always generate embeddings using the provider (ignores any precomputed vectors).
    ProviderOnly(&'a dyn EmbeddingsProvider),
    /// Only precomputed embeddings are accepted.
    PrecomputedOnly,
}

impl<'a> EmbeddingPolicy<'a> {
    pub(crate) fn provider(&self) -> Option<&'a dyn EmbeddingsProvider> {
        match *self {
            EmbeddingPolicy::PrecomputedOr(p) | EmbeddingPolicy::ProviderOnly(p) => Some(p),
            EmbeddingPolicy::PrecomputedOnly => None,
        }
    }
}

pub mod ollama;
