//! Core data models used by ingestion and retrieval.

use serde::{Deserialize, Serialize};

/// Text of one page, 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// A split, not yet embedded, span of document text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChunk {
    pub page: u32,
    pub chunk_index: usize,
    pub text: String,
}

/// Metadata stored next to each vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub namespace: String,
    pub page: u32,
    pub chunk_index: usize,
}

/// A chunk with its vector, ready for the index.
#[derive(Clone, Debug)]
pub struct EmbeddingChunk {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// One similarity-search result, best first.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkHit {
    pub score: f32,
    pub text: String,
    pub page: u32,
    pub chunk_index: usize,
}
