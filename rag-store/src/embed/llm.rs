//! Embeddings through the shared LLM service (`embedding` profile).

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;

use crate::{
    embed::{EmbedFuture, EmbeddingsProvider},
    errors::RagError,
};

#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: Option<usize>,
}

impl LlmEmbedder {
    /// `dim`: if set, every returned vector must have exactly this size.
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            let v = self
                .svc
                .embed(text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;
            match self.dim {
                Some(want) if v.len() != want => {
                    Err(RagError::VectorSizeMismatch { got: v.len(), want })
                }
                _ if v.is_empty() => Err(RagError::Embedding("provider returned an empty vector".into())),
                _ => Ok(v),
            }
        })
    }
}
