//! Record dump readers.
//!
//! Two layouts are accepted for [`read_all_records`]:
//! - a single JSON array of records (the format written by the embedding scripts),
//! - JSONL, one record per line.

use crate::errors::RagError;
use crate::record::RagRecord;
use std::io::{BufRead, BufReader, Read};
use std::{fs::File, path::Path};
use tracing::{debug, info};

/// Reads a record dump, detecting array vs. line-delimited layout.
///
/// - Expects at least `id` and `text` per record.
/// - Ignores empty lines in JSONL.
///
/// # Errors
/// - [`RagError::Io`] if the file cannot be read.
/// - [`RagError::Parse`] if any record fails to deserialize.
pub fn read_all_records(path: impl AsRef<Path>) -> Result<Vec<RagRecord>, RagError> {
    info!(path = ?path.as_ref(), "reading record dump");

    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let starts_with_array = {
        let buf = reader.fill_buf()?;
        buf.iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'[')
    };

    let out = if starts_with_array {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        parse_array(&s)?
    } else {
        parse_lines(reader)?
    };

    debug!(records = out.len(), "record dump loaded");
    Ok(out)
}

fn parse_array(s: &str) -> Result<Vec<RagRecord>, RagError> {
    serde_json::from_str(s).map_err(|e| RagError::Parse(format!("json array: {e}")))
}

fn parse_lines(reader: impl BufRead) -> Result<Vec<RagRecord>, RagError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let r: RagRecord = serde_json::from_str(&line)
            .map_err(|e| RagError::Parse(format!("line {} parse error: {}", i + 1, e)))?;
        out.push(r);
    }
    Ok(out)
}
