//! Collaborator fakes for driving the router without Ollama or Qdrant.

use std::{future::Future, path::PathBuf, pin::Pin, sync::Arc, time::Duration};

use answer_engine::{AnswerEngine, DomainCatalog, EngineConfig, GenerationError, TextGenerator};
use rag_store::{BoxFuture, EmbeddingsProvider, PassageIndex, RagError, RetrievedPassage};

use crate::core::app_state::AppState;

const ARG_15A: &str = "Art. 15a Tägliche Ruhezeit\n\
    1 Den Arbeitnehmern ist eine tägliche Ruhezeit von mindestens elf aufeinander folgenden Stunden zu gewähren.";

const OR_321C: &str = "Art. 321c Überstunden\n\
    1 Wird gegenüber dem zeitlichen Umfang der Arbeit mehr Arbeitszeit notwendig, so ist der Arbeitnehmer zur Leistung von Überstundenarbeit verpflichtet.";

pub fn labor_passages() -> Vec<RetrievedPassage> {
    vec![
        RetrievedPassage::new(ARG_15A, 0.4, "ArG", "015"),
        RetrievedPassage::new(OR_321C, 0.9, "OR", "321"),
    ]
}

struct Embedder;

impl EmbeddingsProvider for Embedder {
    fn embed<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async { Ok(vec![0.5, 0.5]) })
    }
}

struct Generator;

impl TextGenerator for Generator {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async {
            Ok("Die tägliche Ruhezeit beträgt mindestens elf zusammenhängende Stunden.".to_string())
        })
    }

    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}

struct Index {
    passages: Vec<RetrievedPassage>,
    up: bool,
}

impl Index {
    fn check(&self) -> Result<(), RagError> {
        if self.up {
            Ok(())
        } else {
            Err(RagError::NotConnected("connection refused".into()))
        }
    }
}

impl PassageIndex for Index {
    fn ping(&self) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async { self.check() })
    }

    fn collection_exists(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        Box::pin(async { self.check().map(|_| true) })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(async { self.check().map(|_| self.passages.len() as u64) })
    }

    fn query<'a>(
        &'a self,
        _vector: &'a [f32],
        k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievedPassage>, RagError>> {
        Box::pin(async move {
            self.check()?;
            let mut out = self.passages.clone();
            out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            out.truncate(k as usize);
            Ok(out)
        })
    }

    fn sources(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>> {
        Box::pin(async {
            self.check()?;
            let mut names: Vec<String> =
                self.passages.iter().map(|p| p.metadata.source.clone()).collect();
            names.sort();
            names.dedup();
            Ok(names)
        })
    }
}

/// State over fakes; `index_up = false` makes every index call fail.
pub fn app_state(passages: Vec<RetrievedPassage>, index_up: bool) -> AppState {
    build(passages, index_up, None)
}

/// Like [`app_state`], recording answers to the quality log at `log`.
pub fn app_state_with_log(passages: Vec<RetrievedPassage>, log: PathBuf) -> AppState {
    build(passages, true, Some(log))
}

fn build(passages: Vec<RetrievedPassage>, index_up: bool, log: Option<PathBuf>) -> AppState {
    let cfg = EngineConfig {
        generation_timeout: Duration::from_millis(500),
        index_timeout: Duration::from_millis(500),
        quality_log_path: log,
        ..EngineConfig::default()
    };
    let index = Index {
        passages,
        up: index_up,
    };
    let generator: Arc<dyn TextGenerator> = Arc::new(Generator);
    let engine = AnswerEngine::new(
        cfg,
        DomainCatalog::builtin(),
        Arc::new(Embedder),
        Arc::new(index),
        Some(generator),
    );
    AppState::new(Arc::new(engine))
}
