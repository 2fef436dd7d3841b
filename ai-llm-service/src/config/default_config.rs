//! Default LLM configs loaded from environment variables.
//!
//! Two roles exist for the legal QA backend:
//!
//! - **Generation** → small instruction model that rephrases statute excerpts
//! - **Embedding**  → embedding model shared by ingestion and retrieval
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (defaults to `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = generation model (default `llama3.2:3b`)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//! - `LLM_MAX_TOKENS`              = optional `num_predict` (default 150)
//! - `LLM_TIMEOUT_SECS`            = optional generation timeout (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, EnvLookup, must_var, opt_u32, opt_u64, process_env,
    },
};

/// Endpoint used when neither `OLLAMA_URL` nor `OLLAMA_PORT` is set.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Generation model used when `OLLAMA_MODEL` is unset.
pub const DEFAULT_GENERATION_MODEL: &str = "llama3.2:3b";

/// Stop sequences that end a completion before the model starts echoing
/// the prompt scaffolding.
pub const DEFAULT_STOP: [&str; 2] = ["\n\nFrage:", "Kontext:"];

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. [`DEFAULT_OLLAMA_ENDPOINT`]
///
/// # Errors
///
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint(lookup: EnvLookup<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = lookup("OLLAMA_URL").filter(|u| !u.trim().is_empty()) {
        return Ok(url.trim().to_string());
    }
    if let Some(port) = lookup("OLLAMA_PORT").filter(|p| !p.trim().is_empty()) {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Ok(DEFAULT_OLLAMA_ENDPOINT.to_string())
}

/// Constructs the **generation** profile from the process environment.
///
/// # Defaults
/// - `temperature = 0.2`, `top_p = 0.8`
/// - `num_ctx = 2048`, `repeat_penalty = 1.1`
/// - `max_tokens = 150`, `timeout_secs = 60`
/// - stop on `"\n\nFrage:"` and `"Kontext:"`
pub fn config_ollama_generation() -> Result<LlmModelConfig, AiLlmError> {
    generation_from(&process_env)
}

/// Same as [`config_ollama_generation`] over an arbitrary lookup.
pub fn generation_from(lookup: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(lookup)?;
    let model = lookup("OLLAMA_MODEL")
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string());
    let max_tokens = opt_u32(lookup, "LLM_MAX_TOKENS")?.unwrap_or(150);
    let timeout_secs = opt_u64(lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(60);

    let cfg = LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens: Some(max_tokens),
        temperature: Some(0.2),
        top_p: Some(0.8),
        num_ctx: Some(2048),
        repeat_penalty: Some(1.1),
        stop: DEFAULT_STOP.iter().map(|s| s.to_string()).collect(),
        timeout_secs: Some(timeout_secs),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile from the process environment.
///
/// # Env
/// - `EMBEDDING_MODEL` (required)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    embedding_from(&process_env)
}

/// Same as [`config_ollama_embedding`] over an arbitrary lookup.
pub fn embedding_from(lookup: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(lookup)?;
    let model = must_var(lookup, "EMBEDDING_MODEL")?;

    let cfg = LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        num_ctx: None,
        repeat_penalty: None,
        stop: Vec::new(),
        timeout_secs: Some(30),
    };
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn generation_defaults() {
        let cfg = generation_from(&env(&[])).unwrap();
        assert_eq!(cfg.endpoint, DEFAULT_OLLAMA_ENDPOINT);
        assert_eq!(cfg.model, DEFAULT_GENERATION_MODEL);
        assert_eq!(cfg.max_tokens, Some(150));
        assert_eq!(cfg.num_ctx, Some(2048));
        assert_eq!(cfg.stop, vec!["\n\nFrage:".to_string(), "Kontext:".to_string()]);
        assert_eq!(cfg.timeout_secs, Some(60));
    }

    #[test]
    fn port_fallback_and_invalid_port() {
        let cfg = generation_from(&env(&[("OLLAMA_PORT", "11500")])).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:11500");

        assert!(generation_from(&env(&[("OLLAMA_PORT", "99999")])).is_err());
    }

    #[test]
    fn url_wins_over_port() {
        let cfg = generation_from(&env(&[
            ("OLLAMA_URL", "http://ollama:11434"),
            ("OLLAMA_PORT", "1"),
            ("LLM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint, "http://ollama:11434");
        assert_eq!(cfg.timeout_secs, Some(5));
    }

    #[test]
    fn embedding_requires_model() {
        let err = embedding_from(&env(&[])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("EMBEDDING_MODEL"))
        ));

        let cfg = embedding_from(&env(&[("EMBEDDING_MODEL", "all-minilm")])).unwrap();
        assert_eq!(cfg.model, "all-minilm");
        assert!(cfg.stop.is_empty());
    }
}
