//! Unified error type for ingestion and retrieval.

use doc_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Document is missing, owned by someone else, or has no download URL.
    #[error("[RAG Store] document not found: {0}")]
    DocumentNotFound(String),

    /// Object fetch returned a non-2xx status.
    #[error("[RAG Store] fetch failed with HTTP {status}: {snippet}")]
    Fetch {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Object fetch could not reach the server.
    #[error("[RAG Store] fetch transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Download URL is not an `http(s)://` locator.
    #[error("[RAG Store] unsupported download url: {0}")]
    UnsupportedUrl(String),

    /// Vector index could not answer the existence query.
    #[error("[RAG Store] namespace check failed for `{namespace}`: {reason}")]
    NamespaceCheck { namespace: String, reason: String },

    #[error("[RAG Store] embedding failed: {0}")]
    Embedding(String),

    #[error("[RAG Store] vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Vector index read/write failure.
    #[error("[RAG Store] vector index error: {0}")]
    Index(String),

    /// Source bytes could not be turned into text.
    #[error("[RAG Store] parse error: {0}")]
    Parse(String),

    #[error("[RAG Store] document has no extractable text")]
    EmptyDocument,

    #[error("[RAG Store] config error: {0}")]
    Config(String),

    #[error("[RAG Store] document store error: {0}")]
    Store(StoreError),

    #[error("[RAG Store] {op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },
}

impl From<StoreError> for RagError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DocumentNotFound { document_id } => RagError::DocumentNotFound(document_id),
            other => RagError::Store(other),
        }
    }
}

impl From<qdrant_client::QdrantError> for RagError {
    fn from(e: qdrant_client::QdrantError) -> Self {
        RagError::Index(e.to_string())
    }
}
