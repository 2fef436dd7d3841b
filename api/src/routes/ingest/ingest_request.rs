use std::path::PathBuf;

use serde::Deserialize;

/// Request payload for `POST /ingest`.
///
/// `path` names either a record dump (JSON array or JSONL) or a directory of
/// `*.txt` statute files.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub path: PathBuf,
    /// Drop and recreate the collection first.
    #[serde(default)]
    pub recreate: bool,
    #[serde(default)]
    pub embeddings: EmbeddingMode,
}

/// Where record embeddings come from. Text directories always use the embedder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    #[default]
    PrecomputedOrEmbed,
    AlwaysEmbed,
    PrecomputedOnly,
}
