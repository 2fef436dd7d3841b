//! Application context running the full question → answer pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rag_store::{EmbeddingsProvider, PassageIndex, RagError, RetrievedPassage};
use tracing::{error, info, instrument, warn};

use crate::api_types::{AnswerResult, Confidence, HealthReport};
use crate::area::DomainCatalog;
use crate::cfg::EngineConfig;
use crate::collab::TextGenerator;
use crate::confidence::{score_confidence, source_refs};
use crate::error::{EngineError, IndexFailure};
use crate::extract::extract_sentences;
use crate::filter::filter_passages;
use crate::gate::{GateVerdict, check_relevance};
use crate::messages;
use crate::quality::{QualityEntry, QualityLog};
use crate::synthesize::{SynthSettings, synthesize};
use crate::templates::with_sources_suffix;

/// Init-once, read-many context shared by all requests.
///
/// Holds the collaborators and the immutable configuration; no state
/// changes while answering, so one instance serves concurrent requests.
pub struct AnswerEngine {
    cfg: EngineConfig,
    catalog: DomainCatalog,
    embedder: Arc<dyn EmbeddingsProvider>,
    index: Arc<dyn PassageIndex>,
    generator: Option<Arc<dyn TextGenerator>>,
    quality: Option<QualityLog>,
}

impl AnswerEngine {
    /// Wires the pipeline. A `None` generator answers from templates only.
    pub fn new(
        cfg: EngineConfig,
        catalog: DomainCatalog,
        embedder: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn PassageIndex>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let quality = cfg.quality_log_path.clone().map(QualityLog::new);
        Self {
            cfg,
            catalog,
            embedder,
            index,
            generator,
            quality,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &DomainCatalog {
        &self.catalog
    }

    pub fn quality_log(&self) -> Option<&QualityLog> {
        self.quality.as_ref()
    }

    /// Answers one question.
    ///
    /// # Errors
    /// Only [`EngineError::EmptyQuestion`], before any embedding or
    /// retrieval. Every later failure is turned into an [`AnswerResult`]
    /// with confidence `error` (infrastructure) or `honest` (refusal).
    #[instrument(skip_all, fields(question = %question.trim()))]
    pub async fn answer(&self, question: &str) -> Result<AnswerResult, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::EmptyQuestion);
        }
        info!("answering question");

        let (retrieved, result) = match self.retrieve(question).await {
            Ok(passages) => {
                let result = self.answer_from(question, &passages).await;
                (passages, result)
            }
            Err(message) => (Vec::new(), AnswerResult::bare(message, Confidence::Error)),
        };

        info!(
            confidence = result.confidence.as_str(),
            sources = result.sources.len(),
            "answer ready"
        );
        self.log_quality(question, &retrieved, &result).await;
        Ok(result)
    }

    /// Embed → check index → query. Errors are already user-facing texts.
    async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedPassage>, &'static str> {
        let vector = self.embedder.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed");
            messages::EMBEDDER_UNAVAILABLE
        })?;

        let failure = |f: IndexFailure| {
            warn!(?f, "index unavailable");
            messages::for_index_failure(f)
        };

        match self.guarded(self.index.collection_exists()).await {
            Ok(true) => {}
            Ok(false) => return Err(failure(IndexFailure::CollectionMissing)),
            Err(e) => return Err(failure(IndexFailure::from(&e))),
        }
        match self.guarded(self.index.count()).await {
            Ok(0) => return Err(failure(IndexFailure::EmptyCollection)),
            Ok(_) => {}
            Err(e) => return Err(failure(IndexFailure::from(&e))),
        }
        self.guarded(self.index.query(&vector, self.cfg.top_k))
            .await
            .map_err(|e| {
                error!(error = %e, "index query failed");
                match IndexFailure::from(&e) {
                    IndexFailure::NotConnected => failure(IndexFailure::NotConnected),
                    _ => failure(IndexFailure::QueryFailed),
                }
            })
    }

    /// Gate → classify → filter → extract → synthesize → score.
    async fn answer_from(&self, question: &str, passages: &[RetrievedPassage]) -> AnswerResult {
        let best = passages.iter().map(|p| p.distance).min_by(f32::total_cmp);
        match check_relevance(&self.catalog, question, best, self.cfg.relevance_max_distance) {
            GateVerdict::Pass => {}
            GateVerdict::NoPassages => {
                return AnswerResult::bare(messages::NO_DOCUMENTS, Confidence::Honest);
            }
            GateVerdict::OutOfDomain | GateVerdict::TooDistant => {
                return AnswerResult::bare(messages::OUT_OF_DOMAIN, Confidence::Honest);
            }
        }

        let area = self.catalog.classify(question);
        let filtered = filter_passages(passages, &self.cfg.filter, &self.catalog, area);
        let Some(best_kept) = filtered.best_kept() else {
            info!(%area, "no passage passed the filter");
            return AnswerResult::bare(messages::LOW_GROUNDING, Confidence::Honest);
        };

        let sentences = extract_sentences(
            question,
            &filtered.kept,
            &self.catalog,
            area,
            self.cfg.extract_tier,
        );

        let generator = if self.cfg.generation_enabled {
            self.generator.as_deref()
        } else {
            None
        };
        let settings = SynthSettings {
            max_sentences: self.cfg.prompt_max_sentences,
            max_chars: self.cfg.prompt_max_chars,
            timeout: self.cfg.generation_timeout,
        };
        let synthesis = synthesize(generator, settings, &self.catalog, question, area, &sentences)
            .await;

        let sources = source_refs(&filtered.kept);
        AnswerResult {
            answer: with_sources_suffix(&synthesis.text, &sources),
            sources,
            confidence: score_confidence(synthesis.generated, best_kept),
        }
    }

    /// Collaborator diagnostics, probed concurrently.
    pub async fn health(&self) -> HealthReport {
        let generative = async {
            match &self.generator {
                Some(g) if self.cfg.generation_enabled => g.is_reachable().await,
                _ => false,
            }
        };
        let (embedder_loaded, ping, count, generative_reachable) = tokio::join!(
            self.embedder.probe(),
            self.guarded(self.index.ping()),
            self.guarded(self.index.count()),
            generative,
        );

        let index_connected = ping.is_ok();
        let report = HealthReport {
            status: if index_connected { "healthy" } else { "unhealthy" }.to_string(),
            embedder_loaded,
            index_connected,
            document_count: count.unwrap_or(0),
            generative_reachable,
        };
        info!(?report, "health checked");
        report
    }

    /// Sorted distinct source names; empty on any failure.
    pub async fn sources(&self) -> Vec<String> {
        match self.guarded(self.index.sources()).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "listing sources failed");
                Vec::new()
            }
        }
    }

    /// Bounds an index call by the configured timeout.
    async fn guarded<T>(
        &self,
        fut: impl Future<Output = Result<T, RagError>>,
    ) -> Result<T, RagError> {
        let limit: Duration = self.cfg.index_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(RagError::NotConnected(format!(
                "no answer within {}s",
                limit.as_secs_f32()
            ))),
        }
    }

    async fn log_quality(&self, question: &str, retrieved: &[RetrievedPassage], result: &AnswerResult) {
        let Some(log) = &self.quality else { return };
        let entry = QualityEntry::new(question, retrieved, result);
        if let Err(e) = log.record(&entry).await {
            warn!(error = %e, path = %log.path().display(), "quality log write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::test_support::{
        FakeEmbedder, FakeGenerator, FakeIndex, GeneratorBehavior, IndexFault,
    };

    const ARG_15A: &str = "Art. 15a Tägliche Ruhezeit\n\
        1 Den Arbeitnehmern ist eine tägliche Ruhezeit von mindestens elf aufeinander folgenden Stunden zu gewähren.\n\
        2 Die Ruhezeit kann für erwachsene Arbeitnehmer einmal in der Woche bis auf acht Stunden herabgesetzt werden.";

    fn cfg() -> EngineConfig {
        EngineConfig {
            generation_timeout: Duration::from_millis(200),
            index_timeout: Duration::from_millis(200),
            quality_log_path: None,
            ..EngineConfig::default()
        }
    }

    struct Rig {
        engine: AnswerEngine,
        embedder: Arc<FakeEmbedder>,
        index: Arc<FakeIndex>,
        generator: Arc<FakeGenerator>,
    }

    fn rig_with(cfg: EngineConfig, embedder: FakeEmbedder, index: FakeIndex, g: GeneratorBehavior) -> Rig {
        let embedder = Arc::new(embedder);
        let index = Arc::new(index);
        let generator = Arc::new(FakeGenerator::new(g));
        let engine = AnswerEngine::new(
            cfg,
            DomainCatalog::builtin(),
            embedder.clone(),
            index.clone(),
            Some(generator.clone()),
        );
        Rig {
            engine,
            embedder,
            index,
            generator,
        }
    }

    fn rig(index: FakeIndex, g: GeneratorBehavior) -> Rig {
        rig_with(cfg(), FakeEmbedder::ok(), index, g)
    }

    fn ruhezeit_index(distance: f32) -> FakeIndex {
        FakeIndex::with_passages(vec![
            RetrievedPassage::new(ARG_15A, distance, "ArG", "015"),
            RetrievedPassage::new(ARG_15A, distance + 0.1, "ArG", "015"),
            RetrievedPassage::new("Art. 9 Die wöchentliche Höchstarbeitszeit beträgt 45 Stunden.", distance + 0.3, "ArG", "009"),
        ])
    }

    fn reply(text: &str) -> GeneratorBehavior {
        GeneratorBehavior::Reply(text.into())
    }

    #[tokio::test]
    async fn empty_question_does_no_work() {
        let r = rig(ruhezeit_index(0.4), reply("x"));
        for q in ["", "   ", "\n\t"] {
            assert!(matches!(r.engine.answer(q).await, Err(EngineError::EmptyQuestion)));
        }
        assert_eq!(r.embedder.calls(), 0);
        assert_eq!(r.index.queries(), 0);
    }

    #[tokio::test]
    async fn scenario_daily_rest_is_grounded() {
        let r = rig(ruhezeit_index(0.4), GeneratorBehavior::Fail(GenerationError::HttpStatus(503)));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert!(matches!(a.confidence, Confidence::High | Confidence::Medium));
        assert!(a.answer.contains("elf aufeinander folgenden Stunden"));
        assert!(a.answer.ends_with("\n\nQuellen: ArG"));
        assert!(!a.sources.is_empty());
    }

    #[tokio::test]
    async fn generated_answer_with_close_match_is_high() {
        let r = rig(
            ruhezeit_index(0.4),
            reply("Die tägliche Ruhezeit beträgt mindestens elf zusammenhängende Stunden."),
        );
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, Confidence::High);
        assert!(a.answer.starts_with("Die tägliche Ruhezeit beträgt mindestens elf"));
        assert_eq!(r.generator.calls(), 1);
    }

    #[tokio::test]
    async fn scenario_off_topic_is_refused_honestly() {
        let r = rig(ruhezeit_index(2.0), reply("Der FC Basel."));
        let a = r.engine.answer("Welches ist dein Lieblingsfussballverein?").await.unwrap();
        assert_eq!(a.confidence, Confidence::Honest);
        assert_eq!(a.answer, messages::OUT_OF_DOMAIN);
        assert!(a.sources.is_empty());
        assert_eq!(r.generator.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_generation_timeout_uses_template() {
        let r = rig(ruhezeit_index(0.4), GeneratorBehavior::Hang);
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, score_confidence(false, 0.4));
        assert!(a.answer.starts_with("Die tägliche Ruhezeit beträgt in der Schweiz"));
        assert_eq!(a.sources.len(), 2);
        assert_eq!(a.sources[0].chunk_id, "015");
        assert_eq!(a.sources[1].chunk_id, "009");
    }

    #[tokio::test]
    async fn scenario_index_down_is_an_error() {
        let r = rig(FakeIndex::faulty(IndexFault::NotConnected), reply("x"));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, Confidence::Error);
        assert_eq!(a.answer, messages::INDEX_NOT_CONNECTED);
        assert!(a.sources.is_empty());
    }

    #[tokio::test]
    async fn index_failures_have_distinct_messages() {
        let cases = [
            (IndexFault::CollectionMissing, messages::INDEX_COLLECTION),
            (IndexFault::QueryFails, messages::INDEX_QUERY),
            (IndexFault::Hangs, messages::INDEX_NOT_CONNECTED),
        ];
        for (fault, msg) in cases {
            let r = rig(FakeIndex::faulty(fault), reply("x"));
            let a = r.engine.answer("Ruhezeit?").await.unwrap();
            assert_eq!(a.confidence, Confidence::Error);
            assert_eq!(a.answer, msg, "{fault:?}");
        }

        let mut empty = FakeIndex::with_passages(Vec::new());
        empty.count = 0;
        let a = rig(empty, reply("x")).engine.answer("Ruhezeit?").await.unwrap();
        assert_eq!(a.answer, messages::INDEX_EMPTY);
    }

    #[tokio::test]
    async fn embedder_failure_is_an_error() {
        let r = rig_with(cfg(), FakeEmbedder::failing(), ruhezeit_index(0.4), reply("x"));
        let a = r.engine.answer("Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, Confidence::Error);
        assert_eq!(a.answer, messages::EMBEDDER_UNAVAILABLE);
        assert_eq!(r.index.queries(), 0);
    }

    #[tokio::test]
    async fn zero_passages_are_honest() {
        let r = rig(FakeIndex::with_passages(Vec::new()), reply("x"));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, Confidence::Honest);
        assert!(a.sources.is_empty());
    }

    #[tokio::test]
    async fn filter_rejecting_everything_is_honest() {
        // In-domain question passes the gate, but 2.5 is beyond every tier.
        let r = rig(ruhezeit_index(2.5), reply("x"));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.confidence, Confidence::Honest);
        assert_eq!(a.answer, messages::LOW_GROUNDING);
    }

    #[tokio::test]
    async fn fallback_answers_are_deterministic() {
        let r = rig(ruhezeit_index(0.4), GeneratorBehavior::Fail(GenerationError::Timeout));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        let b = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn closer_match_never_lowers_confidence() {
        let q = "Was ist die tägliche Ruhezeit?";
        let mut previous: Option<Confidence> = None;
        for d in [1.3f32, 1.1, 0.9, 0.7, 0.5, 0.3] {
            let r = rig(
                ruhezeit_index(d),
                reply("Die tägliche Ruhezeit beträgt mindestens elf Stunden."),
            );
            let c = r.engine.answer(q).await.unwrap().confidence;
            if let Some(p) = previous {
                assert!(c >= p, "{d}: {c:?} < {p:?}");
            }
            previous = Some(c);
        }
    }

    #[tokio::test]
    async fn closer_best_passage_alone_never_lowers_confidence() {
        // Below 0.6 the tighter tier drops the only passage with usable sentences.
        let q = "Was ist die tägliche Ruhezeit?";
        let mut previous: Option<Confidence> = None;
        for best in [1.1f32, 0.9, 0.8, 0.65, 0.6, 0.5, 0.3] {
            let index = FakeIndex::with_passages(vec![
                RetrievedPassage::new("Seite 3 von 40", best, "StGB", "001"),
                RetrievedPassage::new(ARG_15A, 1.3, "StGB", "002"),
            ]);
            let r = rig(index, reply("Die tägliche Ruhezeit beträgt mindestens elf Stunden."));
            let c = r.engine.answer(q).await.unwrap().confidence;
            if let Some(p) = previous {
                assert!(c >= p, "best {best}: {c:?} < {p:?}");
            }
            previous = Some(c);
        }
        assert_eq!(previous, Some(Confidence::High));
    }

    #[tokio::test]
    async fn source_suffix_matches_the_capped_source_list() {
        let index = FakeIndex::with_passages(vec![
            RetrievedPassage::new(ARG_15A, 0.3, "ArG", "015"),
            RetrievedPassage::new(ARG_15A, 0.4, "OR", "321"),
            RetrievedPassage::new(ARG_15A, 0.5, "ZGB", "002"),
            RetrievedPassage::new(ARG_15A, 0.6, "SVG", "027"),
        ]);
        let r = rig(index, GeneratorBehavior::Fail(GenerationError::Timeout));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(a.sources.len(), 3);
        assert!(a.answer.ends_with("\n\nQuellen: ArG, OR, ZGB"));
        assert!(!a.answer.contains("SVG"));
    }

    #[tokio::test]
    async fn sources_never_repeat() {
        let r = rig(ruhezeit_index(0.4), reply("x"));
        let a = r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        let mut keys: Vec<_> = a.sources.iter().map(|s| (&s.source, &s.chunk_id)).collect();
        let n = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), n);
    }

    #[tokio::test]
    async fn disabled_generation_never_calls_the_model() {
        let cfg = EngineConfig {
            generation_enabled: false,
            ..cfg()
        };
        let r = rig_with(cfg, FakeEmbedder::ok(), ruhezeit_index(0.4), reply("Lange Modellantwort hier."));
        r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        assert_eq!(r.generator.calls(), 0);
    }

    #[tokio::test]
    async fn health_reports_each_collaborator() {
        let r = rig(ruhezeit_index(0.4), reply("x"));
        let h = r.engine.health().await;
        assert!(h.is_healthy());
        assert_eq!(h.status, "healthy");
        assert!(h.embedder_loaded);
        assert_eq!(h.document_count, 100);
        assert!(h.generative_reachable);

        let r = rig(FakeIndex::faulty(IndexFault::NotConnected), GeneratorBehavior::Hang);
        let h = r.engine.health().await;
        assert_eq!(h.status, "unhealthy");
        assert_eq!(h.document_count, 0);
        assert!(!h.generative_reachable);
    }

    #[tokio::test]
    async fn sources_listing_swallows_failures() {
        let r = rig(ruhezeit_index(0.4), reply("x"));
        assert_eq!(r.engine.sources().await, vec!["ArG"]);
        let r = rig(FakeIndex::faulty(IndexFault::NotConnected), reply("x"));
        assert!(r.engine.sources().await.is_empty());
    }

    #[tokio::test]
    async fn answers_are_logged_for_quality() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig {
            quality_log_path: Some(dir.path().join("q.jsonl")),
            ..cfg()
        };
        let r = rig_with(cfg, FakeEmbedder::ok(), ruhezeit_index(0.4), GeneratorBehavior::Hang);
        r.engine.answer("Was ist die tägliche Ruhezeit?").await.unwrap();
        r.engine.answer("Welches ist dein Lieblingsfussballverein?").await.unwrap();

        let entries = r.engine.quality_log().unwrap().load().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].num_results, 3);
        assert_eq!(entries[1].confidence, Confidence::Honest);
    }
}
