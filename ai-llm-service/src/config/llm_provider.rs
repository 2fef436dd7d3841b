/// Represents the provider (backend) used for model inference.
///
/// The backend only talks to a local Ollama runtime today. The enum is kept so
/// that configs, cache keys and health reports carry the provider explicitly.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let provider = LlmProvider::Ollama;
/// assert_eq!(format!("{provider:?}"), "Ollama");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
}
