//! Answer synthesis: generative attempt with a deterministic template fallback.
//!
//! States: `TryGenerative → PostProcess → AcceptOrFallback → TemplateFallback`.
//! Any generation failure (unreachable, timeout, non-200, undecodable, or an
//! answer that fails acceptance) ends in `TemplateFallback`. No retries.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::area::{DomainCatalog, LegalArea};
use crate::collab::TextGenerator;
use crate::error::GenerationError;
use crate::extract::ScoredSentence;
use crate::postprocess;
use crate::prompt::build_prompt;
use crate::templates::template_answer;

/// Bounds of the generative attempt.
#[derive(Clone, Copy, Debug)]
pub struct SynthSettings {
    pub max_sentences: usize,
    pub max_chars: usize,
    pub timeout: Duration,
}

/// Answer text (without source suffix) and whether the model produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Synthesis {
    pub text: String,
    pub generated: bool,
}

enum State {
    TryGenerative,
    PostProcess(String),
    AcceptOrFallback(Option<String>),
    TemplateFallback,
}

/// Runs the synthesis state machine.
///
/// Without a generator it goes straight to the template. An empty sentence
/// list still goes to the model, with an empty context line, so whether the
/// answer is generated does not depend on how many passages the filter kept.
pub async fn synthesize(
    generator: Option<&dyn TextGenerator>,
    settings: SynthSettings,
    catalog: &DomainCatalog,
    question: &str,
    area: LegalArea,
    sentences: &[ScoredSentence],
) -> Synthesis {
    let mut state = match generator {
        Some(_) => State::TryGenerative,
        None => State::TemplateFallback,
    };

    loop {
        state = match state {
            State::TryGenerative => {
                let Some(generator) = generator else {
                    break;
                };
                let prompt = build_prompt(
                    question,
                    sentences,
                    settings.max_sentences,
                    settings.max_chars,
                );
                match call_with_timeout(generator, &prompt, settings.timeout).await {
                    Ok(raw) => State::PostProcess(raw),
                    Err(e) => {
                        warn!(error = %e, "generation unavailable, using template");
                        State::TemplateFallback
                    }
                }
            }
            State::PostProcess(raw) => {
                debug!(raw_len = raw.len(), raw = %raw, "model output");
                State::AcceptOrFallback(postprocess::accept(&raw))
            }
            State::AcceptOrFallback(Some(text)) => {
                info!(len = text.chars().count(), "generated answer accepted");
                return Synthesis {
                    text,
                    generated: true,
                };
            }
            State::AcceptOrFallback(None) => {
                warn!("generated answer rejected, using template");
                State::TemplateFallback
            }
            State::TemplateFallback => break,
        };
    }

    let text = template_answer(catalog, area, question, sentences.first());
    info!(%area, "template answer built");
    Synthesis {
        text,
        generated: false,
    }
}

async fn call_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(timeout, generator.complete(prompt)).await {
        Ok(res) => res,
        Err(_) => Err(GenerationError::Timeout),
    }
}
