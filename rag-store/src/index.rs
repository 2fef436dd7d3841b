use std::{future::Future, pin::Pin};

use crate::errors::RagError;
use crate::record::RetrievedPassage;

/// Boxed `Send` future returned by the object-safe index trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Nearest-neighbour index over statute passages.
///
/// Failures are reported distinctly: [`RagError::NotConnected`] when the
/// server cannot be reached, [`RagError::CollectionMissing`] when the
/// collection does not exist, [`RagError::QueryFailed`] when the search
/// itself fails. An empty collection is `count() == 0`.
pub trait PassageIndex: Send + Sync {
    /// Checks that the server answers.
    fn ping(&self) -> BoxFuture<'_, Result<(), RagError>>;

    /// Whether the configured collection exists.
    fn collection_exists(&self) -> BoxFuture<'_, Result<bool, RagError>>;

    /// Number of stored passages.
    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>>;

    /// The `k` closest passages, ascending by distance.
    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievedPassage>, RagError>>;

    /// Sorted distinct source names of the corpus.
    fn sources(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>>;
}
