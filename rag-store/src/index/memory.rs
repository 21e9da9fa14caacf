//! In-process vector index with brute-force cosine search.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    errors::RagError,
    index::VectorIndex,
    record::{ChunkHit, EmbeddingChunk},
};

#[derive(Default)]
pub struct MemoryIndex {
    namespaces: RwLock<HashMap<String, Vec<EmbeddingChunk>>>,
    batches: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `upsert` batches.
    pub fn batches_written(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub async fn chunk_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, RagError> {
        Ok(self.namespaces.read().await.contains_key(namespace))
    }

    async fn upsert(&self, namespace: &str, chunks: Vec<EmbeddingChunk>) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Err(RagError::Index("refusing to publish an empty namespace".into()));
        }
        let n = chunks.len();
        // Whole set swapped in under one write lock: readers see all or nothing.
        self.namespaces
            .write()
            .await
            .insert(namespace.to_string(), chunks);
        self.batches.fetch_add(1, Ordering::SeqCst);
        debug!(namespace, chunks = n, "memory namespace published");
        Ok(())
    }

    async fn similarity_search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        k: usize,
    ) -> Result<Vec<ChunkHit>, RagError> {
        let r = self.namespaces.read().await;
        let Some(chunks) = r.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ChunkHit> = chunks
            .iter()
            .map(|c| ChunkHit {
                score: cosine(&vector, &c.vector),
                text: c.text.clone(),
                page: c.metadata.page,
                chunk_index: c.metadata.chunk_index,
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Cosine similarity; 0 for zero-length or mismatched vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
