//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Source label used when a stored point carries no source.
pub const UNKNOWN_SOURCE: &str = "Unbekannt";

/// Chunk label used when a stored point carries no chunk id.
pub const UNKNOWN_CHUNK: &str = "N/A";

/// Canonical record stored in Qdrant and used in ingestion.
///
/// Accepts the German field names of older dumps (`quelle`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RagRecord {
    pub id: String,
    pub text: String,
    #[serde(default, alias = "quelle")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Provenance of a retrieved passage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PassageMeta {
    pub source: String,
    pub chunk_id: String,
}

/// A passage returned by the index, with a dissimilarity (lower = closer).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RetrievedPassage {
    pub text: String,
    pub distance: f32,
    pub metadata: PassageMeta,
}

impl RetrievedPassage {
    pub fn new(
        text: impl Into<String>,
        distance: f32,
        source: impl Into<String>,
        chunk_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            distance,
            metadata: PassageMeta {
                source: source.into(),
                chunk_id: chunk_id.into(),
            },
        }
    }
}

/// Accepts `"001"` as well as `1` for chunk ids.
fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legacy_field_names() {
        let r: RagRecord = serde_json::from_str(
            r#"{"id":"a","text":"t","quelle":"ArG","chunk_id":"003","filename":"ArG_chunk_003.txt"}"#,
        )
        .unwrap();
        assert_eq!(r.source.as_deref(), Some("ArG"));
        assert_eq!(r.chunk_id.as_deref(), Some("003"));
        assert!(r.embedding.is_none());
    }

    #[test]
    fn numeric_chunk_id_becomes_string() {
        let r: RagRecord = serde_json::from_str(r#"{"id":"a","text":"t","chunk_id":7}"#).unwrap();
        assert_eq!(r.chunk_id.as_deref(), Some("7"));
    }

    #[test]
    fn passage_meta_uses_camel_case() {
        let p = RetrievedPassage::new("x", 0.4, "ArG", "001");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["metadata"]["chunkId"], "001");
    }
}
