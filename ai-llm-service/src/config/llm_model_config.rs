use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    ConfigError, Result, validate_http_endpoint, validate_range_f32, validate_stop_sequences,
};

/// Configuration for a single model invocation profile.
///
/// Decoding knobs are optional; unset values are not sent to the backend so
/// the model defaults apply.
///
/// # Fields
///
/// - `provider`: which backend to use.
/// - `model`: model identifier (e.g., `"llama3.2:3b"`, `"all-minilm"`).
/// - `endpoint`: base URL of the inference server.
/// - `max_tokens`: maximum number of tokens to generate (`num_predict`).
/// - `temperature`: sampling temperature (low = deterministic-leaning).
/// - `top_p`: nucleus sampling cutoff.
/// - `num_ctx`: context window requested from the runtime.
/// - `repeat_penalty`: penalty for repeated tokens.
/// - `stop`: stop sequences that end generation.
/// - `timeout_secs`: request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "llama3.2:3b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: Some(150),
///     temperature: Some(0.2),
///     top_p: Some(0.8),
///     num_ctx: Some(2048),
///     repeat_penalty: Some(1.1),
///     stop: vec!["\n\nFrage:".into()],
///     timeout_secs: Some(60),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (base URL).
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Context window size.
    pub num_ctx: Option<u32>,

    /// Repetition penalty.
    pub repeat_penalty: Option<f32>,

    /// Stop sequences.
    pub stop: Vec<String>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Validates endpoint format, model name and decoding ranges.
    ///
    /// # Errors
    /// Returns [`crate::AiLlmError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("OLLAMA_URL", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        if let Some(r) = self.repeat_penalty {
            validate_range_f32("repeat_penalty", r, 0.0, 5.0)?;
        }
        validate_stop_sequences(&self.stop)
    }
}
