//! Embedding executor with concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::RagError, record::RagRecord};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Embeds texts for records that have no precomputed vectors.
///
/// # Arguments
/// - `records`: mutable slice of `RagRecord`s.
/// - `provider`: embedding backend.
/// - `expected_dim`: if `Some`, enforces this vector size (error on mismatch).
/// - `concurrency`: maximum number of concurrent embedding tasks.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if dimensions mismatch,
/// or the provider error if an embedding call fails.
pub async fn embed_missing(
    records: &mut [RagRecord],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<usize, RagError> {
    let idxs: Vec<usize> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.embedding.is_none().then_some(i))
        .collect();

    if idxs.is_empty() {
        debug!("embed_missing: nothing to embed");
        return Ok(0);
    }
    info!(
        missing = idxs.len(),
        total = records.len(),
        concurrency,
        "embedding records without vectors"
    );

    let texts: Vec<(usize, String)> = idxs.iter().map(|&i| (i, records[i].text.clone())).collect();
    let results: Vec<(usize, Vec<f32>)> = stream::iter(texts)
        .map(|(i, text)| async move {
            let v = provider.embed(&text).await?;
            Ok::<(usize, Vec<f32>), RagError>((i, v))
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RagError>>()?;

    let n = results.len();
    for (i, v) in results {
        if let Some(want) = expected_dim {
            if v.len() != want {
                return Err(RagError::VectorSizeMismatch { got: v.len(), want });
            }
        }
        records[i].embedding = Some(v);
    }

    debug!(embedded = n, "embed_missing: embeddings filled");
    Ok(n)
}
