//! Vector index seam and backends.
//!
//! A namespace (the document id) is either absent or fully populated:
//! [`VectorIndex::namespace_exists`] must never report a half-written
//! namespace as present.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{IndexKind, RagConfig},
    errors::RagError,
    record::{ChunkHit, EmbeddingChunk},
};

pub mod memory;
pub mod qdrant;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, RagError>;

    /// Publishes the whole chunk set of `namespace` as one logical batch.
    async fn upsert(&self, namespace: &str, chunks: Vec<EmbeddingChunk>) -> Result<(), RagError>;

    /// Top `k` chunks of `namespace`, by descending similarity.
    async fn similarity_search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<ChunkHit>, RagError>;

    fn backend(&self) -> &'static str;
}

/// Builds the configured backend.
pub fn build_index(cfg: &RagConfig) -> Result<Arc<dyn VectorIndex>, RagError> {
    Ok(match cfg.index {
        IndexKind::Qdrant => Arc::new(qdrant::QdrantIndex::new(cfg)?),
        IndexKind::Memory => Arc::new(memory::MemoryIndex::new()),
    })
}
