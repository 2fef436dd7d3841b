//! Retrieval helpers: score normalisation and payload → passage mapping.
//!
//! Qdrant reports a similarity for cosine/dot collections and a plain L2
//! distance for euclid collections. Everything leaving this module uses one
//! unit: squared L2 over unit vectors (`0..=4`, lower = closer).

use crate::config::{DistanceKind, RagConfig};
use crate::errors::RagError;
use crate::qdrant_facade::{QdrantFacade, payload_source};
use crate::record::{RetrievedPassage, UNKNOWN_CHUNK, UNKNOWN_SOURCE};

use tracing::trace;

/// Converts a raw Qdrant score into a dissimilarity.
pub fn score_to_distance(kind: DistanceKind, score: f32) -> f32 {
    let d = match kind {
        DistanceKind::Cosine | DistanceKind::Dot => 2.0 * (1.0 - score),
        DistanceKind::Euclid => score * score,
    };
    if d.is_finite() { d.max(0.0) } else { f32::MAX }
}

/// Maps one search hit to a passage. Hits without text are dropped.
pub fn hit_to_passage(kind: DistanceKind, score: f32, payload: &serde_json::Value) -> Option<RetrievedPassage> {
    let text = payload.get("text").and_then(|v| v.as_str())?.trim();
    if text.is_empty() {
        return None;
    }
    let source = payload_source(payload).unwrap_or(UNKNOWN_SOURCE);
    let chunk_id = match payload.get("chunk_id") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_CHUNK.to_string(),
    };
    Some(RetrievedPassage::new(
        text,
        score_to_distance(kind, score),
        source,
        chunk_id,
    ))
}

/// Runs a k-NN query and returns passages sorted ascending by distance.
///
/// # Errors
/// Returns [`RagError::QueryFailed`] when the search call fails.
pub async fn query_passages(
    cfg: &RagConfig,
    client: &QdrantFacade,
    vector: Vec<f32>,
    k: u64,
) -> Result<Vec<RetrievedPassage>, RagError> {
    trace!(k, "retrieve::query_passages");
    let hits = client.search(vector, k, cfg.exact_search).await?;
    Ok(passages_from_hits(client.distance(), hits))
}

/// Converts raw hits and orders them by distance.
pub fn passages_from_hits(
    kind: DistanceKind,
    hits: Vec<(f32, serde_json::Value)>,
) -> Vec<RetrievedPassage> {
    let mut out: Vec<_> = hits
        .iter()
        .filter_map(|(score, payload)| hit_to_passage(kind, *score, payload))
        .collect();
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    out
}
