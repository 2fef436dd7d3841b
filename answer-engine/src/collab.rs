//! Generative-service seam and its Ollama implementation.

use ai_llm_service::{AiLlmError, LlmServiceProfiles, OllamaError};
use rag_store::BoxFuture;
use tracing::warn;

use crate::error::GenerationError;

/// Text completion service used by the synthesizer.
pub trait TextGenerator: Send + Sync {
    /// Completes `prompt`. Any `Err` routes to the template fallback.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>>;

    /// Whether the service answers at all (health reporting only).
    fn is_reachable(&self) -> BoxFuture<'_, bool>;
}

impl From<AiLlmError> for GenerationError {
    fn from(e: AiLlmError) -> Self {
        if e.is_timeout() {
            return GenerationError::Timeout;
        }
        match e {
            AiLlmError::Ollama(OllamaError::HttpStatus { status, .. }) => {
                GenerationError::HttpStatus(status.as_u16())
            }
            AiLlmError::Ollama(OllamaError::Decode(msg)) => GenerationError::Decode(msg),
            other => GenerationError::Unreachable(other.to_string()),
        }
    }
}

impl TextGenerator for LlmServiceProfiles {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            self.generate(prompt).await.map_err(|e| {
                warn!(error = %e, "generation failed");
                GenerationError::from(e)
            })
        })
    }

    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.health_generation().await.ok })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_timeouts_from_any_layer() {
        let e = AiLlmError::Ollama(OllamaError::Timeout(Duration::from_secs(60)));
        assert_eq!(GenerationError::from(e), GenerationError::Timeout);
        assert_eq!(
            GenerationError::from(AiLlmError::Timeout(Duration::from_secs(1))),
            GenerationError::Timeout
        );
    }

    #[test]
    fn maps_decode_and_endpoint_errors() {
        let e = AiLlmError::Ollama(OllamaError::Decode("no response field".into()));
        assert_eq!(
            GenerationError::from(e),
            GenerationError::Decode("no response field".into())
        );
        let e = AiLlmError::Ollama(OllamaError::InvalidEndpoint("x".into()));
        assert!(matches!(GenerationError::from(e), GenerationError::Unreachable(_)));
    }
}
