//! Ollama embedding provider backed by the shared [`LlmServiceProfiles`].

use std::{future::Future, pin::Pin, sync::Arc};

use crate::{EmbeddingsProvider, RagError};
use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::warn;

/// Ollama embedding provider (async).
#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected embedding dimension, checked on every call when set.
    dim: Option<usize>,
}

impl OllamaEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    warn!(got = v.len(), want, "embedding dimension mismatch");
                    return Err(RagError::VectorSizeMismatch { got: v.len(), want });
                }
            }
            Ok(v)
        })
    }

    fn probe<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move { self.svc.health_embedding().await.ok })
    }
}
