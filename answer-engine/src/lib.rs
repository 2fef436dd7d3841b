//! Retrieval-and-answer pipeline for questions about Swiss statutes.
//!
//! Public API: [`AnswerEngine`]. For one question it embeds the text,
//! queries the passage index, applies the relevance gate, classifies the
//! legal area, filters passages by a dynamic distance threshold, extracts
//! the most relevant sentences, and either lets the generative model phrase
//! the answer or falls back to a deterministic template. The result carries
//! a confidence tier and the contributing sources.
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # use answer_engine::{AnswerEngine, DomainCatalog, EngineConfig};
//! # use ai_llm_service::{LlmServiceProfiles, config_ollama_embedding, config_ollama_generation};
//! # use rag_store::{OllamaEmbedder, RagStore};
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_ollama_generation()?,
//!     config_ollama_embedding()?,
//!     Some(5),
//! )?);
//! let store = Arc::new(RagStore::new(answer_engine::cfg::rag_config_from(&|k: &str| std::env::var(k).ok())?)?);
//! let engine = AnswerEngine::new(
//!     EngineConfig::from_env()?,
//!     DomainCatalog::builtin(),
//!     Arc::new(OllamaEmbedder::new(svc.clone(), None)),
//!     store,
//!     Some(svc),
//! );
//! let a = engine.answer("Was ist die tägliche Ruhezeit?").await?;
//! println!("{} ({:?})", a.answer, a.confidence);
//! # Ok(()) }
//! ```

mod api_types;
mod area;
pub mod cfg;
mod collab;
mod confidence;
mod engine;
mod error;
mod extract;
mod filter;
mod gate;
mod keywords;
pub mod messages;
mod postprocess;
pub mod prompt;
pub mod quality;
mod synthesize;
mod templates;

#[cfg(test)]
mod test_support;

pub use api_types::{AnswerResult, Confidence, HealthReport, SourceRef};
pub use area::{AreaProfile, DomainCatalog, LegalArea, TopicTemplate};
pub use cfg::EngineConfig;
pub use collab::TextGenerator;
pub use confidence::{relevance_percent, score_confidence};
pub use engine::AnswerEngine;
pub use error::{EngineError, GenerationError};
pub use extract::{ExtractTier, ScoredSentence, extract_sentences};
pub use filter::{FilterOutcome, FilterPolicy, filter_passages};
pub use gate::{GateVerdict, check_relevance};
pub use synthesize::{SynthSettings, Synthesis, synthesize};
