//! Embedding executor with bounded concurrency and dimension checks.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::{
    embed::{EmbedFuture, EmbeddingsProvider},
    errors::RagError,
    record::{ChunkMetadata, EmbeddingChunk, TextChunk},
};

/// Embeds every chunk, keeping input order.
///
/// - `expected_dim`: if `Some`, enforces this vector size; otherwise the
///   first vector fixes the size for the rest of the batch.
/// - `concurrency`: maximum number of in-flight embedding calls.
///
/// # Errors
/// The first provider failure or [`RagError::VectorSizeMismatch`]; the
/// remaining in-flight calls are dropped.
pub async fn embed_chunks(
    namespace: &str,
    chunks: Vec<TextChunk>,
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<Vec<EmbeddingChunk>, RagError> {
    info!(namespace, total = chunks.len(), concurrency, "embedding chunks");

    let pending: Vec<EmbedFuture<'_>> = chunks.iter().map(|c| provider.embed(&c.text)).collect();
    let vectors: Vec<Vec<f32>> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let want = expected_dim.or_else(|| vectors.first().map(Vec::len));
    let mut out = Vec::with_capacity(chunks.len());
    for (chunk, vector) in chunks.into_iter().zip(vectors) {
        if let Some(want) = want {
            if vector.len() != want {
                return Err(RagError::VectorSizeMismatch {
                    got: vector.len(),
                    want,
                });
            }
        }
        out.push(EmbeddingChunk {
            metadata: ChunkMetadata {
                namespace: namespace.to_string(),
                page: chunk.page,
                chunk_index: chunk.chunk_index,
            },
            text: chunk.text,
            vector,
        });
    }

    debug!(namespace, embedded = out.len(), "embeddings filled");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::hashing::HashingEmbedder;
    use std::time::Duration;

    /// Slower for earlier chunks, so completion order differs from input order.
    struct Staggered;

    impl EmbeddingsProvider for Staggered {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
            Box::pin(async move {
                let n: u64 = text.parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(40 - n * 10)).await;
                Ok(vec![n as f32, 1.0])
            })
        }
    }

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk {
                page: 1,
                chunk_index: i,
                text: t.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn order_is_preserved_under_concurrency() {
        let out = embed_chunks("ns", chunks(&["0", "1", "2", "3"]), &Staggered, None, 4)
            .await
            .unwrap();
        let firsts: Vec<f32> = out.iter().map(|c| c.vector[0]).collect();
        assert_eq!(firsts, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(out.iter().all(|c| c.metadata.namespace == "ns"));
    }

    #[tokio::test]
    async fn dimension_is_enforced() {
        let err = embed_chunks("ns", chunks(&["a"]), &HashingEmbedder::new(8), Some(16), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 8, want: 16 }));
    }
}
