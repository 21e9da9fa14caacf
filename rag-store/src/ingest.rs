//! Document ingestion: fetch -> parse -> split -> embed -> publish.
//!
//! A namespace (the document id) is either absent or populated. Any failure
//! aborts the run before the index publishes the namespace, so the next
//! caller simply retries.

use std::{future::Future, sync::Arc, time::Duration};

use doc_store::DocumentStore;
use services::locks::KeyedLocks;
use tracing::{debug, info, instrument};

use crate::{
    config::RagConfig,
    embed::EmbeddingsProvider,
    embed_pool::embed_chunks,
    errors::RagError,
    fetch::ObjectFetch,
    index::VectorIndex,
    parse::parse_pages,
    record::ChunkHit,
    splitter::RecursiveSplitter,
};

/// Knobs taken from [`RagConfig`].
#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub embedding_dim: Option<usize>,
    pub embedding_concurrency: usize,
    pub call_timeout: Duration,
    pub ingest_timeout: Duration,
}

impl From<&RagConfig> for IngestOptions {
    fn from(cfg: &RagConfig) -> Self {
        Self {
            embedding_dim: cfg.embedding_dim,
            embedding_concurrency: cfg.embedding_concurrency,
            call_timeout: cfg.call_timeout,
            ingest_timeout: cfg.ingest_timeout,
        }
    }
}

/// How [`Ingestor::ensure_embedded`] obtained the namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Reused,
    Created { chunks: usize },
}

/// Retrieval handle bound to one populated namespace.
#[derive(Clone)]
pub struct NamespaceHandle {
    namespace: String,
    outcome: IngestOutcome,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    call_timeout: Duration,
}

impl std::fmt::Debug for NamespaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceHandle")
            .field("namespace", &self.namespace)
            .field("outcome", &self.outcome)
            .field("index", &self.index.backend())
            .finish()
    }
}

impl NamespaceHandle {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn outcome(&self) -> IngestOutcome {
        self.outcome
    }

    /// Embeds `query` and returns the `k` most similar chunks of this namespace.
    ///
    /// # Errors
    /// Embedding or index failures, or [`RagError::Timeout`].
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ChunkHit>, RagError> {
        let vector = bounded("embed query", self.call_timeout, self.embedder.embed(query)).await?;
        let hits = bounded(
            "similarity search",
            self.call_timeout,
            self.index.similarity_search(&self.namespace, vector, k),
        )
        .await?;
        debug!(namespace = %self.namespace, k, hits = hits.len(), "context retrieved");
        Ok(hits)
    }
}

/// Idempotent ingestion of documents into per-document namespaces.
pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    fetcher: Arc<dyn ObjectFetch>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    splitter: RecursiveSplitter,
    opts: IngestOptions,
    locks: KeyedLocks,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn ObjectFetch>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
        splitter: RecursiveSplitter,
        opts: IngestOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            index,
            embedder,
            splitter,
            opts,
            locks: KeyedLocks::new(),
        }
    }

    /// Builds the splitter and options from `cfg`.
    ///
    /// # Errors
    /// [`RagError::Config`] if the chunking parameters are invalid.
    pub fn from_config(
        cfg: &RagConfig,
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn ObjectFetch>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        let splitter = RecursiveSplitter::new(cfg.chunk_size, cfg.chunk_overlap)?;
        Ok(Self::new(store, fetcher, index, embedder, splitter, cfg.into()))
    }

    /// Returns a handle to the populated namespace of `document_id`,
    /// ingesting the document first if the namespace is absent.
    ///
    /// Calls for the same document are serialised inside this process; the
    /// existence check is repeated under the lock so only the first caller
    /// populates.
    ///
    /// # Errors
    /// - [`RagError::NamespaceCheck`] if the index cannot answer.
    /// - [`RagError::DocumentNotFound`] for unknown documents or missing URLs.
    /// - Fetch, parse, embedding or index errors from the population run.
    /// - [`RagError::Timeout`] if a call or the whole run exceeds its bound.
    #[instrument(level = "info", skip(self), fields(backend = self.index.backend()))]
    pub async fn ensure_embedded(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<NamespaceHandle, RagError> {
        if self.exists(document_id).await? {
            info!(namespace = document_id, "namespace already exists, reusing");
            return Ok(self.handle(document_id, IngestOutcome::Reused));
        }

        let _guard = self.locks.lock(document_id).await;
        if self.exists(document_id).await? {
            info!(namespace = document_id, "namespace populated concurrently, reusing");
            return Ok(self.handle(document_id, IngestOutcome::Reused));
        }

        let chunks = bounded(
            "ingestion",
            self.opts.ingest_timeout,
            self.populate(user_id, document_id),
        )
        .await?;
        info!(namespace = document_id, chunks, "namespace created");
        Ok(self.handle(document_id, IngestOutcome::Created { chunks }))
    }

    async fn exists(&self, namespace: &str) -> Result<bool, RagError> {
        bounded(
            "namespace check",
            self.opts.call_timeout,
            self.index.namespace_exists(namespace),
        )
        .await
        .map_err(|e| match e {
            RagError::Timeout { .. } | RagError::NamespaceCheck { .. } => e,
            other => RagError::NamespaceCheck {
                namespace: namespace.to_string(),
                reason: other.to_string(),
            },
        })
    }

    async fn populate(&self, user_id: &str, document_id: &str) -> Result<usize, RagError> {
        let doc = bounded(
            "document lookup",
            self.opts.call_timeout,
            async {
                self.store
                    .get_document(user_id, document_id)
                    .await
                    .map_err(RagError::from)
            },
        )
        .await?;
        if doc.download_url.trim().is_empty() {
            return Err(RagError::DocumentNotFound(document_id.to_string()));
        }
        debug!(document_id, url = %doc.download_url, "download url resolved");

        let bytes = bounded(
            "fetch",
            self.opts.call_timeout,
            self.fetcher.fetch(&doc.download_url),
        )
        .await?;
        info!(document_id, bytes = bytes.len(), "document loaded");

        let pages = parse_pages(bytes).await?;
        let chunks = self.splitter.split_pages(&pages);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument);
        }
        info!(document_id, pages = pages.len(), parts = chunks.len(), "document split");

        let embedded = embed_chunks(
            document_id,
            chunks,
            self.embedder.as_ref(),
            self.opts.embedding_dim,
            self.opts.embedding_concurrency,
        )
        .await?;
        let total = embedded.len();

        bounded(
            "index upsert",
            self.opts.call_timeout,
            self.index.upsert(document_id, embedded),
        )
        .await?;
        Ok(total)
    }

    fn handle(&self, namespace: &str, outcome: IngestOutcome) -> NamespaceHandle {
        NamespaceHandle {
            namespace: namespace.to_string(),
            outcome,
            index: Arc::clone(&self.index),
            embedder: Arc::clone(&self.embedder),
            call_timeout: self.opts.call_timeout,
        }
    }
}

/// Runs `fut` with a deadline, mapping expiry to [`RagError::Timeout`].
pub(crate) async fn bounded<T, F>(op: &'static str, limit: Duration, fut: F) -> Result<T, RagError>
where
    F: Future<Output = Result<T, RagError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(RagError::Timeout {
            op,
            secs: limit.as_secs(),
        }),
    }
}
