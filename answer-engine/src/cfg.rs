//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ai_llm_service::error_handler::{EnvLookup, process_env};
use rag_store::{DistanceKind, RagConfig};

use crate::error::EngineError;
use crate::extract::ExtractTier;
use crate::filter::FilterPolicy;

/// Config bag for the answer pipeline. All fields have defaults.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Passages fetched per question.
    pub top_k: u64,
    /// Relevance gate ceiling for questions without in-domain terms.
    pub relevance_max_distance: f32,
    pub filter: FilterPolicy,
    pub extract_tier: ExtractTier,

    // Prompt bounds
    pub prompt_max_sentences: usize,
    pub prompt_max_chars: usize,

    /// `false` skips the generative service and always uses templates.
    pub generation_enabled: bool,
    pub generation_timeout: Duration,
    /// Upper bound for every vector index call.
    pub index_timeout: Duration,

    /// JSON catalog replacing the built-in keywords and templates.
    pub catalog_path: Option<PathBuf>,
    /// JSONL answer-quality log; `None` disables logging.
    pub quality_log_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            relevance_max_distance: 1.5,
            filter: FilterPolicy::default(),
            extract_tier: ExtractTier::Lenient,
            prompt_max_sentences: 2,
            prompt_max_chars: 800,
            generation_enabled: true,
            generation_timeout: Duration::from_secs(60),
            index_timeout: Duration::from_secs(10),
            catalog_path: None,
            quality_log_path: Some(PathBuf::from("logs/answer_quality.jsonl")),
        }
    }
}

impl EngineConfig {
    /// Build from the process environment.
    ///
    /// # Example
    /// ```
    /// # use answer_engine::EngineConfig;
    /// let cfg = EngineConfig::from_env().unwrap();
    /// assert!(cfg.top_k >= 1);
    /// ```
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(&process_env)
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] for unparsable or out-of-range values.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, EngineError> {
        let d = Self::default();
        let df = d.filter;

        let cfg = Self {
            top_k: parse(lookup, "RAG_TOP_K", d.top_k)?,
            relevance_max_distance: parse(
                lookup,
                "RELEVANCE_MAX_DISTANCE",
                d.relevance_max_distance,
            )?,
            filter: FilterPolicy {
                tight_below: parse(lookup, "FILTER_TIGHT_BELOW", df.tight_below)?,
                medium_below: parse(lookup, "FILTER_MEDIUM_BELOW", df.medium_below)?,
                tight: parse(lookup, "FILTER_TIGHT", df.tight)?,
                medium: parse(lookup, "FILTER_MEDIUM", df.medium)?,
                loose: parse(lookup, "FILTER_LOOSE", df.loose)?,
                source_bonus: parse(lookup, "FILTER_SOURCE_BONUS", df.source_bonus)?,
            },
            extract_tier: parse(lookup, "EXTRACT_TIER", d.extract_tier)?,
            prompt_max_sentences: parse(lookup, "PROMPT_MAX_SENTENCES", d.prompt_max_sentences)?,
            prompt_max_chars: parse(lookup, "PROMPT_MAX_CHARS", d.prompt_max_chars)?,
            generation_enabled: parse_bool(lookup, "GENERATION_ENABLED", d.generation_enabled)?,
            generation_timeout: Duration::from_secs(parse(
                lookup,
                "LLM_TIMEOUT_SECS",
                d.generation_timeout.as_secs(),
            )?),
            index_timeout: Duration::from_secs(parse(
                lookup,
                "QDRANT_TIMEOUT_SECS",
                d.index_timeout.as_secs(),
            )?),
            catalog_path: non_empty(lookup, "DOMAIN_CATALOG_PATH").map(PathBuf::from),
            quality_log_path: match lookup("QUALITY_LOG_PATH") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(PathBuf::from(v.trim())),
                None => d.quality_log_path,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks ranges and tier ordering.
    pub fn validate(&self) -> Result<(), EngineError> {
        let f = &self.filter;
        if self.top_k == 0 {
            return Err(EngineError::Config("RAG_TOP_K must be > 0".into()));
        }
        if !(0.0..=4.0).contains(&self.relevance_max_distance) {
            return Err(EngineError::Config(
                "RELEVANCE_MAX_DISTANCE must be within 0..=4".into(),
            ));
        }
        if f.tight_below > f.medium_below || f.tight > f.medium || f.medium > f.loose {
            return Err(EngineError::Config(
                "filter tiers must be ordered tight <= medium <= loose".into(),
            ));
        }
        if f.source_bonus < 0.0 {
            return Err(EngineError::Config("FILTER_SOURCE_BONUS must be >= 0".into()));
        }
        if self.prompt_max_sentences == 0 || self.prompt_max_chars == 0 {
            return Err(EngineError::Config("prompt bounds must be > 0".into()));
        }
        if self.generation_timeout.is_zero() || self.index_timeout.is_zero() {
            return Err(EngineError::Config("timeouts must be > 0".into()));
        }
        Ok(())
    }
}

/// Builds the `rag_store::RagConfig` used by `RagStore`.
///
/// # Example
/// ```
/// # use answer_engine::cfg::rag_config_from;
/// let lookup = |k: &str| (k == "QDRANT_COLLECTION").then(|| "gesetze".to_string());
/// let rag_cfg = rag_config_from(&lookup).unwrap();
/// assert_eq!(rag_cfg.collection, "gesetze");
/// ```
pub fn rag_config_from(lookup: EnvLookup<'_>) -> Result<RagConfig, EngineError> {
    let url = env(lookup, "QDRANT_URL", "http://127.0.0.1:6334");
    let collection = env(lookup, "QDRANT_COLLECTION", "gesetzestexte");
    let mut cfg = RagConfig::new_default(url, collection);

    cfg.qdrant_api_key = non_empty(lookup, "QDRANT_API_KEY");
    cfg.distance = parse::<DistanceKind>(lookup, "QDRANT_DISTANCE", DistanceKind::Cosine)?;
    cfg.upsert_batch = parse(lookup, "QDRANT_BATCH_SIZE", cfg.upsert_batch)?;
    cfg.exact_search = parse_bool(lookup, "RAG_EXACT_SEARCH", cfg.exact_search)?;
    cfg.timeout_secs = parse(lookup, "QDRANT_TIMEOUT_SECS", cfg.timeout_secs)?;
    cfg.embedding_dim = match non_empty(lookup, "EMBEDDING_DIM") {
        Some(v) => Some(v.parse().map_err(|_| invalid("EMBEDDING_DIM", &v))?),
        None => None,
    };
    cfg.embedding_concurrency =
        parse(lookup, "EMBEDDING_CONCURRENCY", cfg.embedding_concurrency)?;

    cfg.validate()?;
    Ok(cfg)
}

fn env(lookup: EnvLookup<'_>, k: &str, dflt: &str) -> String {
    non_empty(lookup, k).unwrap_or_else(|| dflt.to_string())
}

fn non_empty(lookup: EnvLookup<'_>, k: &str) -> Option<String> {
    lookup(k)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(lookup: EnvLookup<'_>, k: &str, dflt: T) -> Result<T, EngineError> {
    match non_empty(lookup, k) {
        Some(v) => v.parse().map_err(|_| invalid(k, &v)),
        None => Ok(dflt),
    }
}

fn parse_bool(lookup: EnvLookup<'_>, k: &str, dflt: bool) -> Result<bool, EngineError> {
    match non_empty(lookup, k).map(|v| v.to_ascii_lowercase()) {
        None => Ok(dflt),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Ok(false),
        Some(v) => Err(invalid(k, &v)),
    }
}

fn invalid(k: &str, v: &str) -> EngineError {
    EngineError::Config(format!("{k}: invalid value '{v}'"))
}
