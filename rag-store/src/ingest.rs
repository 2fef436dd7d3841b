//! Ingestion pipeline: records → resolve vectors → (re)create collection → upsert in batches.
//!
//! Two inputs are supported:
//! - a record dump (JSON array or JSONL) with or without precomputed embeddings,
//! - a directory of plain `*.txt` statute texts, chunked into word windows.

use std::collections::HashSet;
use std::path::Path;

use crate::chunk::load_text_dir;
use crate::config::{RagConfig, VectorSpace};
use crate::embed::EmbeddingPolicy;
use crate::embed_pool::embed_missing;
use crate::errors::RagError;
use crate::io_jsonl::read_all_records;
use crate::qdrant_facade::{QdrantFacade, record_payload};
use crate::record::RagRecord;

use indicatif::{ProgressBar, ProgressStyle};
use qdrant_client::qdrant::PointStruct;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Records read from the input (after de-duplication).
    pub records: usize,
    /// Records whose vector was computed during this run.
    pub embedded: usize,
    /// Points acknowledged by the index.
    pub upserted: u64,
    /// Dimensionality of the stored vectors.
    pub vector_size: usize,
}

/// Deterministic UUIDv5 point id for a record id.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Ingests a record dump file.
pub async fn ingest_file(
    cfg: &RagConfig,
    path: impl AsRef<Path>,
    policy: EmbeddingPolicy<'_>,
    recreate: bool,
    client: &QdrantFacade,
) -> Result<IngestReport, RagError> {
    info!(path = ?path.as_ref(), recreate, "ingesting record dump");
    let records = read_all_records(path)?;
    ingest_records(cfg, records, policy, recreate, client).await
}

/// Chunks and ingests every `*.txt` file of a directory.
pub async fn ingest_text_dir(
    cfg: &RagConfig,
    dir: impl AsRef<Path>,
    policy: EmbeddingPolicy<'_>,
    recreate: bool,
    client: &QdrantFacade,
) -> Result<IngestReport, RagError> {
    let records = load_text_dir(dir)?;
    ingest_records(cfg, records, policy, recreate, client).await
}

/// Core ingestion over in-memory records.
pub async fn ingest_records(
    cfg: &RagConfig,
    mut records: Vec<RagRecord>,
    policy: EmbeddingPolicy<'_>,
    recreate: bool,
    client: &QdrantFacade,
) -> Result<IngestReport, RagError> {
    dedup_by_id(&mut records);
    if records.is_empty() {
        warn!("no records to ingest");
        return Ok(IngestReport::default());
    }

    let embedded = resolve_vectors(cfg, &mut records, policy).await?;
    let vector_size = vector_size(&records, cfg.embedding_dim)?;

    let space = VectorSpace {
        size: vector_size,
        distance: cfg.distance,
    };
    if recreate {
        client.recreate_collection(&space).await?;
    } else {
        client.ensure_collection(&space).await?;
    }

    let batch_size = cfg.upsert_batch.max(1);
    let pb = ProgressBar::new(records.len().div_ceil(batch_size) as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut upserted: u64 = 0;
    for chunk in records.chunks(batch_size) {
        upserted += client.upsert_points(build_points(chunk)?).await?;
        pb.inc(1);
    }
    pb.finish_with_message("ingestion complete");

    let report = IngestReport {
        records: records.len(),
        embedded,
        upserted,
        vector_size,
    };
    info!(?report, "ingestion finished");
    Ok(report)
}

// ---------- helpers ----------

/// Keeps the first record per id.
fn dedup_by_id(recs: &mut Vec<RagRecord>) {
    let mut seen: HashSet<String> = HashSet::with_capacity(recs.len());
    let before = recs.len();
    recs.retain(|r| seen.insert(r.id.clone()));
    if recs.len() != before {
        warn!(dropped = before - recs.len(), "duplicate record ids dropped");
    }
}

/// Fills vectors according to the policy. Returns how many were computed.
async fn resolve_vectors(
    cfg: &RagConfig,
    records: &mut [RagRecord],
    policy: EmbeddingPolicy<'_>,
) -> Result<usize, RagError> {
    if let EmbeddingPolicy::ProviderOnly(_) = policy {
        for r in records.iter_mut() {
            r.embedding = None;
        }
    }
    match policy.provider() {
        Some(p) => {
            embed_missing(records, p, cfg.embedding_dim, cfg.embedding_concurrency).await
        }
        None if records.iter().any(|r| r.embedding.is_none()) => Err(RagError::MissingEmbedding),
        None => Ok(0),
    }
}

/// Determines the common vector size and rejects mixed dimensions.
fn vector_size(records: &[RagRecord], expected: Option<usize>) -> Result<usize, RagError> {
    let mut size = expected;
    for r in records {
        let v = r.embedding.as_ref().ok_or(RagError::MissingEmbedding)?;
        match size {
            Some(want) if v.len() != want => {
                return Err(RagError::VectorSizeMismatch { got: v.len(), want });
            }
            Some(_) => {}
            None => size = Some(v.len()),
        }
    }
    size.filter(|s| *s > 0)
        .ok_or_else(|| RagError::Config("cannot determine vector size".into()))
}

/// Builds Qdrant points for a batch of records with resolved vectors.
fn build_points(chunk: &[RagRecord]) -> Result<Vec<PointStruct>, RagError> {
    chunk
        .iter()
        .map(|r| {
            let vector = r.embedding.clone().ok_or(RagError::MissingEmbedding)?;
            Ok(PointStruct::new(
                stable_uuid(&r.id).to_string(),
                vector,
                record_payload(r),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbeddingsProvider;
    use std::future::Future;
    use std::pin::Pin;

    struct FixedEmbedder;

    impl EmbeddingsProvider for FixedEmbedder {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
            Box::pin(async { Ok(vec![0.5; 4]) })
        }
    }

    fn rec(id: &str, embedding: Option<Vec<f32>>) -> RagRecord {
        RagRecord {
            id: id.into(),
            text: format!("Art. {id}"),
            source: Some("ArG".into()),
            chunk_id: Some("001".into()),
            filename: None,
            embedding,
        }
    }

    fn cfg() -> RagConfig {
        RagConfig::new_default("http://127.0.0.1:6334", "gesetzestexte")
    }

    #[test]
    fn point_ids_are_stable() {
        assert_eq!(stable_uuid("ArG_chunk_001"), stable_uuid("ArG_chunk_001"));
        assert_ne!(stable_uuid("ArG_chunk_001"), stable_uuid("ArG_chunk_002"));
    }

    #[test]
    fn dedup_keeps_first() {
        let mut v = vec![rec("a", None), rec("b", None), rec("a", Some(vec![1.0]))];
        dedup_by_id(&mut v);
        assert_eq!(v.len(), 2);
        assert!(v[0].embedding.is_none());
    }

    #[tokio::test]
    async fn precomputed_only_requires_vectors() {
        let mut v = vec![rec("a", Some(vec![1.0; 4])), rec("b", None)];
        let err = resolve_vectors(&cfg(), &mut v, EmbeddingPolicy::PrecomputedOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::MissingEmbedding));
    }

    #[tokio::test]
    async fn provider_only_recomputes_everything() {
        let mut v = vec![rec("a", Some(vec![1.0; 3])), rec("b", None)];
        let n = resolve_vectors(&cfg(), &mut v, EmbeddingPolicy::ProviderOnly(&FixedEmbedder))
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(vector_size(&v, None).unwrap(), 4);
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let v = vec![rec("a", Some(vec![1.0; 4])), rec("b", Some(vec![1.0; 3]))];
        assert!(matches!(
            vector_size(&v, None),
            Err(RagError::VectorSizeMismatch { got: 3, want: 4 })
        ));
        assert!(matches!(
            vector_size(&v[..1], Some(8)),
            Err(RagError::VectorSizeMismatch { got: 4, want: 8 })
        ));
    }

    #[test]
    fn points_carry_payload() {
        let pts = build_points(&[rec("a", Some(vec![0.1, 0.2]))]).unwrap();
        assert_eq!(pts.len(), 1);
        assert!(pts[0].payload.contains_key("source"));
        assert!(pts[0].payload.contains_key("chunk_id"));
    }
}
