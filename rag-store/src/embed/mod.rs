//! Embedding abstraction.

use std::{future::Future, pin::Pin};

use crate::errors::RagError;

pub mod hashing;
pub mod llm;

/// Boxed future returned by [`EmbeddingsProvider::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in an embedding backend (LLM service,
/// local model, test double).
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;
}
