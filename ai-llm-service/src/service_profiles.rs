//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+timeout).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmServiceProfiles, config_ollama_embedding, config_ollama_generation};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_ollama_generation()?,
//!     config_ollama_embedding()?,
//!     Some(5),
//! )?);
//!
//! let txt = svc.generate("Wie lange dauert die tägliche Ruhezeit?").await?;
//! let emb = svc.embed("Ruhezeit").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::ollama_service::OllamaService,
};

/// Shared service that manages the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles.
    ///
    /// Both configs are validated up-front.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for invalid profiles and
    /// [`AiLlmError::HttpTransport`] if the health client cannot be built.
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        generation.validate()?;
        embedding.validate()?;

        Ok(Self {
            generation,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Ollama`] if generation fails (including timeouts).
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let cli = self.get_or_init_ollama(&self.generation).await?;
        cli.generate(prompt).await.map_err(AiLlmError::from)
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Ollama`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cli = self.get_or_init_ollama(&self.embedding).await?;
        cli.embeddings(input).await.map_err(AiLlmError::from)
    }

    /// Health snapshot of the generation profile.
    pub async fn health_generation(&self) -> HealthStatus {
        self.health.check(&self.generation).await
    }

    /// Health snapshot of the embedding profile.
    pub async fn health_embedding(&self) -> HealthStatus {
        self.health.check(&self.embedding).await
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.generation.clone()];
        if self.embedding != self.generation {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    #[cfg(test)]
    async fn cached_clients(&self) -> usize {
        self.ollama.read().await.len()
    }
}

/// Internal cache key to identify unique client configs.
///
/// Decoding options are part of the key since they are baked into the
/// request body of the cached client.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    timeout: Option<u64>,
    options: String,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            timeout: cfg.timeout_secs,
            options: format!(
                "{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
                cfg.max_tokens, cfg.temperature, cfg.top_p, cfg.num_ctx, cfg.repeat_penalty, cfg.stop
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://127.0.0.1:9".into(),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            num_ctx: None,
            repeat_penalty: None,
            stop: Vec::new(),
            timeout_secs: Some(1),
        }
    }

    #[test]
    fn rejects_invalid_profile() {
        let mut bad = cfg("gen");
        bad.endpoint = "nope".into();
        assert!(LlmServiceProfiles::new(bad, cfg("emb"), None).is_err());
    }

    #[tokio::test]
    async fn clients_are_cached_per_profile() {
        let svc = LlmServiceProfiles::new(cfg("gen"), cfg("emb"), Some(1)).unwrap();
        let a = svc.get_or_init_ollama(&svc.generation).await.unwrap();
        let b = svc.get_or_init_ollama(&svc.generation).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let _ = svc.get_or_init_ollama(&svc.embedding).await.unwrap();
        assert_eq!(svc.cached_clients().await, 2);
    }

    #[tokio::test]
    async fn identical_profiles_are_probed_once() {
        let svc = LlmServiceProfiles::new(cfg("same"), cfg("same"), Some(1)).unwrap();
        assert_eq!(svc.health_all().await.len(), 1);
    }
}
