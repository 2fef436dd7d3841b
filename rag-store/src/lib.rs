//! Statute passage index over Qdrant: ingestion + distance-ordered retrieval.
//!
//! This crate provides:
//! - [`PassageIndex`], the seam the answer pipeline queries,
//! - [`RagStore`], its Qdrant-backed implementation,
//! - ingestion of record dumps and plain-text corpora,
//! - [`EmbeddingsProvider`] with an Ollama-backed implementation.

mod chunk;
mod config;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod ingest;
mod io_jsonl;
mod qdrant_facade;
mod record;
mod retrieve;

pub use chunk::{CHUNK_OVERLAP, CHUNK_WORDS, MIN_CHUNK_CHARS, chunk_document, split_words};
pub use config::{DistanceKind, RagConfig, VectorSpace};
pub use embed::ollama::OllamaEmbedder;
pub use embed::{EmbeddingPolicy, EmbeddingsProvider};
pub use errors::RagError;
pub use index::{BoxFuture, PassageIndex};
pub use ingest::{IngestReport, stable_uuid};
pub use record::{PassageMeta, RagRecord, RetrievedPassage, UNKNOWN_CHUNK, UNKNOWN_SOURCE};
pub use retrieve::score_to_distance;

use std::path::Path;

use tracing::{debug, trace};

/// High-level facade that wires configuration and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration or client setup is invalid.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// Active configuration.
    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Ingests a record dump (JSON array or JSONL).
    ///
    /// # Errors
    /// Returns errors on I/O, parse, vector size mismatch, or Qdrant failures.
    pub async fn ingest_records_file(
        &self,
        path: impl AsRef<Path>,
        policy: EmbeddingPolicy<'_>,
        recreate: bool,
    ) -> Result<IngestReport, RagError> {
        debug!(path = ?path.as_ref(), "RagStore::ingest_records_file");
        ingest::ingest_file(&self.cfg, path, policy, recreate, &self.client).await
    }

    /// Chunks every `*.txt` file of `dir` and ingests the chunks.
    ///
    /// # Errors
    /// Returns errors on I/O, embedding, or Qdrant failures.
    pub async fn ingest_text_dir(
        &self,
        dir: impl AsRef<Path>,
        policy: EmbeddingPolicy<'_>,
        recreate: bool,
    ) -> Result<IngestReport, RagError> {
        debug!(dir = ?dir.as_ref(), "RagStore::ingest_text_dir");
        ingest::ingest_text_dir(&self.cfg, dir, policy, recreate, &self.client).await
    }
}

impl PassageIndex for RagStore {
    fn ping(&self) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(self.client.health_check())
    }

    fn collection_exists(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        Box::pin(self.client.collection_exists())
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(self.client.count())
    }

    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievedPassage>, RagError>> {
        Box::pin(retrieve::query_passages(
            &self.cfg,
            &self.client,
            vector.to_vec(),
            k,
        ))
    }

    fn sources(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>> {
        Box::pin(self.client.distinct_sources())
    }
}
