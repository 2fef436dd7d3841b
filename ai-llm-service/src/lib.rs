//! Shared LLM service used by the legal question-answering backend.
//!
//! Two logical profiles are managed:
//! - **generation** → the model that phrases answers from retrieved statute text
//! - **embedding**  → the model that maps questions and passages into vectors
//!
//! Only the local Ollama runtime is supported. Callers construct one
//! [`service_profiles::LlmServiceProfiles`], wrap it in `Arc` and share it.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{
    default_config::{config_ollama_embedding, config_ollama_generation},
    llm_model_config::LlmModelConfig,
    llm_provider::LlmProvider,
};
pub use error_handler::{AiLlmError, ConfigError, HealthError};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::{OllamaError, OllamaService};
