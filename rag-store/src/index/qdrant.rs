//! Qdrant-backed vector index.
//!
//! All namespaces share one collection. Every point carries a keyword
//! `namespace` payload and a `kind` (`chunk` | `marker`). Chunks are
//! upserted in batches with `wait=true`; the completion marker is written
//! last, and [`QdrantIndex::namespace_exists`] counts markers only. A crash
//! halfway through leaves chunk points without a marker, which reads as
//! absent, and the retry overwrites them because point ids are derived
//! from `namespace#index`.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::{
    Payload, Qdrant,
    qdrant::{
        CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance,
        FieldType, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
        VectorParamsBuilder, value::Kind,
    },
};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    config::RagConfig,
    errors::RagError,
    filters::{NAMESPACE_FIELD, PointKind, namespace_filter},
    index::VectorIndex,
    record::{ChunkHit, EmbeddingChunk},
};

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    upsert_batch: usize,
    /// Set once the collection is known to exist.
    ready: OnceCell<()>,
}

impl QdrantIndex {
    /// # Errors
    /// [`RagError::Config`] on invalid config or client construction failure.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Config(format!("qdrant client: {e}")))?;

        info!(url = %cfg.qdrant_url, collection = %cfg.collection, "qdrant index configured");
        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            upsert_batch: cfg.upsert_batch,
            ready: OnceCell::new(),
        })
    }

    /// Creates the collection (cosine, `dim`) and the namespace index if missing.
    async fn ensure_collection(&self, dim: usize) -> Result<(), RagError> {
        self.ready
            .get_or_try_init(|| self.create_if_missing(dim))
            .await?;
        Ok(())
    }

    async fn create_if_missing(&self, dim: usize) -> Result<(), RagError> {
        if self.client.collection_exists(&self.collection).await? {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        info!(collection = %self.collection, dim, "creating collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, Distance::Cosine)),
            )
            .await?;
        self.client
            .create_field_index(
                CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    NAMESPACE_FIELD,
                    FieldType::Keyword,
                )
                .wait(true),
            )
            .await?;
        Ok(())
    }

    fn point(id: String, vector: Vec<f32>, payload: serde_json::Value) -> Result<PointStruct, RagError> {
        let payload = Payload::try_from(payload).map_err(|e| RagError::Index(e.to_string()))?;
        Ok(PointStruct::new(id, vector, payload))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, RagError> {
        if self.ready.get().is_none() && !self.client.collection_exists(&self.collection).await? {
            return Ok(false);
        }
        let res = self
            .client
            .count(marker_count(&self.collection, namespace))
            .await?;
        let count = res.result.map_or(0, |r| r.count);
        debug!(namespace, markers = count, "namespace existence checked");
        Ok(count > 0)
    }

    async fn upsert(&self, namespace: &str, chunks: Vec<EmbeddingChunk>) -> Result<(), RagError> {
        let Some(first) = chunks.first() else {
            return Err(RagError::Index("refusing to publish an empty namespace".into()));
        };
        let dim = first.vector.len();
        let marker_vector = first.vector.clone();
        self.ensure_collection(dim).await?;

        let total = chunks.len();
        let mut points = Vec::with_capacity(total);
        for c in chunks {
            let id = services::uuid::chunk_point_id(namespace, c.metadata.chunk_index).to_string();
            let payload = json!({
                "namespace": namespace,
                "kind": PointKind::Chunk.as_str(),
                "page": c.metadata.page,
                "chunk_index": c.metadata.chunk_index,
                "text": c.text,
            });
            points.push(Self::point(id, c.vector, payload)?);
        }

        let mut written = 0usize;
        while !points.is_empty() {
            let rest = points.split_off(self.upsert_batch.min(points.len()));
            let batch = std::mem::replace(&mut points, rest);
            written += batch.len();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, batch).wait(true))
                .await?;
            debug!(namespace, written, total, "chunk batch upserted");
        }

        // Marker last: only now does the namespace read as present.
        let marker = Self::point(
            services::uuid::marker_point_id(namespace).to_string(),
            marker_vector,
            json!({
                "namespace": namespace,
                "kind": PointKind::Marker.as_str(),
                "chunks": total,
            }),
        )?;
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![marker]).wait(true))
            .await?;

        info!(namespace, chunks = total, "namespace published");
        Ok(())
    }

    async fn similarity_search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<ChunkHit>, RagError> {
        let res = self
            .client
            .search_points(chunk_search(&self.collection, namespace, vector, k))
            .await?;

        let mut out = Vec::with_capacity(res.result.len());
        for point in res.result {
            match hit_from_payload(point.score, point.payload) {
                Some(hit) => out.push(hit),
                None => warn!(namespace, "skipping point with malformed payload"),
            }
        }
        debug!(namespace, hits = out.len(), "similarity search completed");
        Ok(out)
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

/// Exact count of completion markers; chunks never make a namespace present.
fn marker_count(collection: &str, namespace: &str) -> CountPointsBuilder {
    CountPointsBuilder::new(collection)
        .filter(namespace_filter(namespace, PointKind::Marker))
        .exact(true)
}

/// Nearest chunk points of one namespace; the marker is never a hit.
fn chunk_search(collection: &str, namespace: &str, vector: Vec<f32>, k: usize) -> SearchPointsBuilder {
    SearchPointsBuilder::new(collection, vector, k as u64)
        .filter(namespace_filter(namespace, PointKind::Chunk))
        .with_payload(true)
}

fn hit_from_payload(score: f32, payload: HashMap<String, QValue>) -> Option<ChunkHit> {
    let text = match payload.get("text")?.kind.as_ref()? {
        Kind::StringValue(s) => s.clone(),
        _ => return None,
    };
    let int = |key: &str| match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(i)) => Some(*i),
        Some(Kind::DoubleValue(d)) => Some(*d as i64),
        _ => None,
    };
    Some(ChunkHit {
        score,
        text,
        page: u32::try_from(int("page").unwrap_or(0)).unwrap_or(0),
        chunk_index: usize::try_from(int("chunk_index").unwrap_or(0)).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::must_keywords;

    fn kw(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn existence_counts_only_markers() {
        let req = marker_count("pdf_chunks", "doc-9").build();
        assert_eq!(req.exact, Some(true));
        let filter = req.filter.unwrap();
        assert_eq!(
            must_keywords(&filter),
            vec![kw("namespace", "doc-9"), kw("kind", "marker")]
        );
    }

    #[test]
    fn search_sees_only_chunks_of_the_namespace() {
        let req = chunk_search("pdf_chunks", "doc-9", vec![0.1, 0.2], 4).build();
        assert_eq!(req.limit, 4);
        let filter = req.filter.unwrap();
        assert_eq!(
            must_keywords(&filter),
            vec![kw("namespace", "doc-9"), kw("kind", "chunk")]
        );
    }

    fn s(v: &str) -> QValue {
        QValue {
            kind: Some(Kind::StringValue(v.into())),
        }
    }

    fn i(v: i64) -> QValue {
        QValue {
            kind: Some(Kind::IntegerValue(v)),
        }
    }

    #[test]
    fn payload_maps_to_hit() {
        let payload = HashMap::from([
            ("text".to_string(), s("hello")),
            ("page".to_string(), i(3)),
            ("chunk_index".to_string(), i(7)),
        ]);
        let hit = hit_from_payload(0.5, payload).unwrap();
        assert_eq!((hit.text.as_str(), hit.page, hit.chunk_index), ("hello", 3, 7));
    }

    #[test]
    fn payload_without_text_is_skipped() {
        assert!(hit_from_payload(0.5, HashMap::from([("page".to_string(), i(1))])).is_none());
    }
}
