use std::{path::PathBuf, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles, config_ollama_embedding, config_ollama_generation,
    error_handler::{EnvLookup, process_env},
};
use answer_engine::{AnswerEngine, DomainCatalog, EngineConfig, TextGenerator, cfg::rag_config_from};
use rag_store::{OllamaEmbedder, RagStore};
use tracing::info;

use crate::error_handler::AppError;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";

/// Seconds allowed for each collaborator health probe.
const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Host-level settings that do not belong to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: String,
    pub frontend_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: EnvLookup<'_>) -> Self {
        let address = lookup("API_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let frontend_dir = lookup("FRONTEND_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FRONTEND_DIR.to_string());
        Self {
            address,
            frontend_dir: PathBuf::from(frontend_dir),
        }
    }
}

/// Store and embedder used by `POST /ingest`.
pub struct Ingestion {
    pub store: Arc<RagStore>,
    pub embedder: Arc<OllamaEmbedder>,
}

/// Shared state of all handlers. Built once at startup.
pub struct AppState {
    pub engine: Arc<AnswerEngine>,
    pub ingestion: Option<Ingestion>,
}

impl AppState {
    /// State without ingestion support.
    pub fn new(engine: Arc<AnswerEngine>) -> Self {
        Self {
            engine,
            ingestion: None,
        }
    }

    /// Wires the engine against Ollama and Qdrant from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        let engine_cfg = EngineConfig::from_env()?;
        let rag_cfg = rag_config_from(&process_env)?;
        let catalog = DomainCatalog::load_or_builtin(engine_cfg.catalog_path.as_deref())?;

        let llm = Arc::new(LlmServiceProfiles::new(
            config_ollama_generation()?,
            config_ollama_embedding()?,
            Some(HEALTH_TIMEOUT_SECS),
        )?);
        let embedder = Arc::new(OllamaEmbedder::new(llm.clone(), rag_cfg.embedding_dim));

        info!(
            qdrant = %rag_cfg.qdrant_url,
            collection = %rag_cfg.collection,
            generation = engine_cfg.generation_enabled,
            "wiring answer engine"
        );
        let store = Arc::new(RagStore::new(rag_cfg)?);

        let generator: Arc<dyn TextGenerator> = llm;
        let engine = AnswerEngine::new(
            engine_cfg,
            catalog,
            embedder.clone(),
            store.clone(),
            Some(generator),
        );

        Ok(Self {
            engine: Arc::new(engine),
            ingestion: Some(Ingestion { store, embedder }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let cfg = ServerConfig::from_lookup(&|_| None);
        assert_eq!(cfg.address, DEFAULT_ADDRESS);
        assert_eq!(cfg.frontend_dir, PathBuf::from("frontend"));
    }

    #[test]
    fn server_overrides_ignore_blank_values() {
        let cfg = ServerConfig::from_lookup(&|k: &str| match k {
            "API_ADDRESS" => Some("127.0.0.1:8080".into()),
            "FRONTEND_DIR" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(cfg.address, "127.0.0.1:8080");
        assert_eq!(cfg.frontend_dir, PathBuf::from(DEFAULT_FRONTEND_DIR));
    }
}
