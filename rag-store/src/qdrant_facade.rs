//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and mapping client failures onto
//! the distinct [`RagError`] variants callers branch on.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::config::{DistanceKind, RagConfig, VectorSpace};
use crate::errors::RagError;
use crate::record::RagRecord;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, ScrollPointsBuilder,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParamsBuilder,
};
use tracing::{debug, info, warn};

/// Page size used when scrolling payloads.
const SCROLL_PAGE: u32 = 256;

/// A facade over the Qdrant client.
pub struct QdrantFacade {
    pub(crate) client: Qdrant,
    pub(crate) collection: String,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// No network traffic happens here; connectivity is checked by
    /// [`QdrantFacade::health_check`].
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.timeout_secs))
            .skip_compatibility_check();
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Config(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
        })
    }

    /// Distance function of the managed collection.
    pub fn distance(&self) -> DistanceKind {
        self.distance
    }

    /// Round-trips the server health endpoint.
    pub async fn health_check(&self) -> Result<(), RagError> {
        self.client
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| RagError::NotConnected(e.to_string()))
    }

    /// Returns `true` if the collection exists.
    pub async fn collection_exists(&self) -> Result<bool, RagError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| RagError::NotConnected(e.to_string()))
    }

    /// Exact number of points in the collection.
    pub async fn count(&self) -> Result<u64, RagError> {
        if !self.collection_exists().await? {
            return Err(RagError::CollectionMissing(self.collection.clone()));
        }
        let res = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;
        Ok(res.result.map(|r| r.count).unwrap_or(0))
    }

    /// Ensures that the collection exists, creating it when missing.
    pub async fn ensure_collection(&self, space: &VectorSpace) -> Result<(), RagError> {
        info!(
            collection = %self.collection,
            size = space.size,
            distance = ?space.distance,
            "ensuring collection"
        );

        if self.collection_exists().await? {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        self.create_collection(space).await
    }

    /// Drops the collection (if present) and creates it again.
    pub async fn recreate_collection(&self, space: &VectorSpace) -> Result<(), RagError> {
        if self.collection_exists().await? {
            warn!(collection = %self.collection, "dropping existing collection");
            self.client
                .delete_collection(&self.collection)
                .await
                .map_err(|e| RagError::Qdrant(e.to_string()))?;
        }
        self.create_collection(space).await
    }

    async fn create_collection(&self, space: &VectorSpace) -> Result<(), RagError> {
        let distance = match space.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(space.size as u64, distance)),
            )
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        info!(collection = %self.collection, "collection created");
        Ok(())
    }

    /// Upserts a batch of points and waits for the write to be applied.
    ///
    /// Returns the number of points sent.
    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<u64, RagError> {
        if points.is_empty() {
            debug!("no points provided for upsert");
            return Ok(0);
        }
        let n = points.len() as u64;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        debug!(collection = %self.collection, points = n, "upsert applied");
        Ok(n)
    }

    /// Performs a similarity search.
    ///
    /// Returns `(score, payload)` tuples in the order Qdrant reports them.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        exact: bool,
    ) -> Result<Vec<(f32, serde_json::Value)>, RagError> {
        debug!(collection = %self.collection, top_k, exact, "searching");

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::QueryFailed(e.to_string()))?;

        let out: Vec<_> = res
            .result
            .into_iter()
            .map(|r| (r.score, qpayload_to_json(r.payload)))
            .collect();

        debug!(hits = out.len(), "search completed");
        Ok(out)
    }

    /// Collects the distinct values of the source field across all points.
    pub async fn distinct_sources(&self) -> Result<Vec<String>, RagError> {
        let mut seen = BTreeSet::new();
        let mut offset = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.collection)
                .limit(SCROLL_PAGE)
                .with_payload(true)
                .with_vectors(false);
            if let Some(o) = offset.take() {
                builder = builder.offset(o);
            }

            let page = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| RagError::QueryFailed(e.to_string()))?;

            for point in page.result {
                let payload = qpayload_to_json(point.payload);
                if let Some(src) = payload_source(&payload) {
                    seen.insert(src.to_string());
                }
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(seen.into_iter().collect())
    }
}

/// Builds the stored payload of a record.
pub(crate) fn record_payload(r: &RagRecord) -> HashMap<String, QValue> {
    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert("text".into(), r.text.clone().into());
    payload.insert("eid".into(), r.id.clone().into());
    if let Some(src) = &r.source {
        payload.insert("source".into(), src.clone().into());
    }
    if let Some(chunk) = &r.chunk_id {
        payload.insert("chunk_id".into(), chunk.clone().into());
    }
    if let Some(f) = &r.filename {
        payload.insert("filename".into(), f.clone().into());
    }
    payload
}

/// Source name from a stored payload (`source`, or the legacy `quelle`).
pub(crate) fn payload_source(payload: &serde_json::Value) -> Option<&str> {
    payload
        .get("source")
        .or_else(|| payload.get("quelle"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Unsupported nested objects/arrays are mapped to `Null`.
pub(crate) fn qpayload_to_json(mut p: HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_round_trips_through_json_view() {
        let r = RagRecord {
            id: "ArG_chunk_001".into(),
            text: "Die tägliche Ruhezeit beträgt elf Stunden.".into(),
            source: Some("ArG".into()),
            chunk_id: Some("001".into()),
            filename: None,
            embedding: None,
        };
        let json = qpayload_to_json(record_payload(&r));
        assert_eq!(json["source"], "ArG");
        assert_eq!(json["chunk_id"], "001");
        assert!(json.get("filename").is_none());
    }

    #[test]
    fn source_falls_back_to_legacy_key() {
        assert_eq!(payload_source(&json!({"quelle": "OR"})), Some("OR"));
        assert_eq!(payload_source(&json!({"source": ""})), None);
    }

    #[tokio::test]
    async fn facade_builds_without_network() {
        let cfg = RagConfig::new_default("http://127.0.0.1:6334", "gesetzestexte");
        let f = QdrantFacade::new(&cfg).unwrap();
        assert_eq!(f.collection, "gesetzestexte");
        assert_eq!(f.distance(), DistanceKind::Cosine);
    }
}
