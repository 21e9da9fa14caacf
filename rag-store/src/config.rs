//! Runtime configuration for ingestion, the vector index and retrieval.

use std::{str::FromStr, time::Duration};

use crate::errors::RagError;

/// Which [`crate::VectorIndex`] backend to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Qdrant,
    Memory,
}

impl FromStr for IndexKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexKind::Qdrant),
            "memory" | "mem" => Ok(IndexKind::Memory),
            other => Err(RagError::Config(format!(
                "VECTOR_INDEX must be `qdrant` or `memory`, got `{other}`"
            ))),
        }
    }
}

/// Configuration for ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub index: IndexKind,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    /// One collection holds every document namespace.
    pub collection: String,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Enforced vector size, when known up front.
    pub embedding_dim: Option<usize>,
    pub embedding_concurrency: usize,
    /// Chunk budget in characters.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Bound for each single remote call (fetch, embed, search).
    pub call_timeout: Duration,
    /// Bound for a whole ingestion run.
    pub ingest_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index: IndexKind::Qdrant,
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "pdf_chunks".into(),
            upsert_batch: 256,
            embedding_dim: None,
            embedding_concurrency: 4,
            chunk_size: 1000,
            chunk_overlap: 200,
            call_timeout: Duration::from_secs(60),
            ingest_timeout: Duration::from_secs(300),
        }
    }
}

impl RagConfig {
    /// Reads overrides from the environment on top of [`RagConfig::default`].
    ///
    /// Variables: `VECTOR_INDEX`, `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION`, `QDRANT_BATCH_SIZE`, `EMBEDDING_DIM`,
    /// `EMBEDDING_CONCURRENCY`, `CHUNK_SIZE`, `CHUNK_OVERLAP`,
    /// `CALL_TIMEOUT_SECS`, `INGEST_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// [`RagError::Config`] on unparsable numbers or invalid combinations.
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();
        let cfg = Self {
            index: match env_str("VECTOR_INDEX") {
                Some(v) => v.parse()?,
                None => d.index,
            },
            qdrant_url: env_str("QDRANT_URL").unwrap_or(d.qdrant_url),
            qdrant_api_key: env_str("QDRANT_API_KEY"),
            collection: env_str("QDRANT_COLLECTION").unwrap_or(d.collection),
            upsert_batch: env_parse("QDRANT_BATCH_SIZE", d.upsert_batch)?,
            embedding_dim: match env_str("EMBEDDING_DIM") {
                Some(_) => Some(env_parse("EMBEDDING_DIM", 0usize)?),
                None => None,
            },
            embedding_concurrency: env_parse("EMBEDDING_CONCURRENCY", d.embedding_concurrency)?,
            chunk_size: env_parse("CHUNK_SIZE", d.chunk_size)?,
            chunk_overlap: env_parse("CHUNK_OVERLAP", d.chunk_overlap)?,
            call_timeout: Duration::from_secs(env_parse(
                "CALL_TIMEOUT_SECS",
                d.call_timeout.as_secs(),
            )?),
            ingest_timeout: Duration::from_secs(env_parse(
                "INGEST_TIMEOUT_SECS",
                d.ingest_timeout.as_secs(),
            )?),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.index == IndexKind::Qdrant && self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.call_timeout.is_zero() || self.ingest_timeout.is_zero() {
            return Err(RagError::Config("timeouts must be > 0".into()));
        }
        Ok(())
    }
}

fn env_str(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(k: &'static str, dflt: T) -> Result<T, RagError> {
    match env_str(k) {
        Some(v) => v
            .parse()
            .map_err(|_| RagError::Config(format!("{k} has an invalid value `{v}`"))),
        None => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RagConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.chunk_size, 1000);
        assert_eq!(cfg.chunk_overlap, 200);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let cfg = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..RagConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn memory_index_needs_no_url() {
        let cfg = RagConfig {
            index: IndexKind::Memory,
            qdrant_url: String::new(),
            ..RagConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!("Memory".parse::<IndexKind>().unwrap(), IndexKind::Memory);
    }
}
