//! Document ingestion and namespace-scoped retrieval.
//!
//! This crate provides:
//! - the [`VectorIndex`] seam with Qdrant and in-memory backends
//! - [`EmbeddingsProvider`] implementations (LLM-backed, feature hashing)
//! - object fetch, PDF page parsing and recursive text splitting
//! - the [`Ingestor`], which populates a document's namespace at most once
//!   and hands out [`NamespaceHandle`]s for retrieval

mod config;
mod embed_pool;
mod errors;
mod filters;
mod ingest;
mod parse;
mod record;
mod splitter;

pub mod embed;
pub mod fetch;
pub mod index;

pub use config::{IndexKind, RagConfig};
pub use embed::{EmbedFuture, EmbeddingsProvider, hashing::HashingEmbedder, llm::LlmEmbedder};
pub use embed_pool::embed_chunks;
pub use errors::RagError;
pub use fetch::{HttpFetcher, MemoryFetcher, ObjectFetch, check_object_url};
pub use index::{VectorIndex, build_index, memory::MemoryIndex, qdrant::QdrantIndex};
pub use ingest::{IngestOptions, IngestOutcome, Ingestor, NamespaceHandle};
pub use parse::{parse_pages, parse_pages_blocking};
pub use record::{ChunkHit, ChunkMetadata, EmbeddingChunk, PageText, TextChunk};
pub use splitter::{DEFAULT_SEPARATORS, RecursiveSplitter};
