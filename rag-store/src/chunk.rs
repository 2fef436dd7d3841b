//! Word-window chunking of plain statute texts.

use std::path::Path;

use crate::errors::RagError;
use crate::record::RagRecord;
use tracing::{debug, info, warn};

/// Words per chunk.
pub const CHUNK_WORDS: usize = 500;
/// Words shared by consecutive chunks.
pub const CHUNK_OVERLAP: usize = 50;
/// Chunks with this many characters or fewer are not indexed.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Splits `text` into windows of `size` words, each starting `size - overlap`
/// words after the previous one.
pub fn split_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    (0..words.len())
        .step_by(step)
        .map(|start| words[start..(start + size).min(words.len())].join(" "))
        .collect()
}

/// Turns one document into records: `source` is the file stem, chunk ids
/// are 3-digit 1-based indices.
pub fn chunk_document(source: &str, text: &str) -> Vec<RagRecord> {
    split_words(text, CHUNK_WORDS, CHUNK_OVERLAP)
        .into_iter()
        .enumerate()
        .filter_map(|(i, chunk)| {
            let chunk = chunk.trim().to_string();
            if chunk.chars().count() <= MIN_CHUNK_CHARS {
                return None;
            }
            let chunk_id = format!("{:03}", i + 1);
            let filename = format!("{source}_chunk_{chunk_id}.txt");
            Some(RagRecord {
                id: format!("{source}_chunk_{chunk_id}"),
                text: chunk,
                source: Some(source.to_string()),
                chunk_id: Some(chunk_id),
                filename: Some(filename),
                embedding: None,
            })
        })
        .collect()
}

/// Reads every `*.txt` file of `dir` (sorted by name) and chunks it.
///
/// # Errors
/// Returns [`RagError::Io`] if the directory cannot be listed. Unreadable
/// files are skipped with a warning.
pub fn load_text_dir(dir: impl AsRef<Path>) -> Result<Vec<RagRecord>, RagError> {
    let dir = dir.as_ref();
    info!(?dir, "chunking text corpus");

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == "txt"))
        .collect();
    files.sort();

    let mut out = Vec::new();
    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let recs = chunk_document(stem, &text);
                debug!(source = stem, chunks = recs.len(), "document chunked");
                out.extend(recs);
            }
            Err(e) => warn!(?path, error = %e, "skipping unreadable file"),
        }
    }
    Ok(out)
}
