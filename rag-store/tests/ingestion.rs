use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use doc_store::{DocumentStore, MemoryDocumentStore};
use rag_store::{
    ChunkHit, EmbedFuture, EmbeddingChunk, EmbeddingsProvider, HashingEmbedder, IngestOptions,
    HttpFetcher, IngestOutcome, Ingestor, MemoryFetcher, MemoryIndex, RagError, RecursiveSplitter,
    VectorIndex,
};

const URL: &str = "mem://docs/handbook.txt";

fn handbook() -> String {
    let mut text = String::new();
    for i in 0..12 {
        text.push_str(&format!(
            "Section {i}. The warranty covers parts and labour for {i} years. \
             Claims are filed through the support portal.\n\n"
        ));
    }
    text.push('\x0C');
    text.push_str("Appendix. Returns are accepted within thirty days of delivery.");
    text
}

/// Counts embedding calls on top of the hashing embedder.
#[derive(Default)]
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl EmbeddingsProvider for CountingEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

struct UnreachableIndex;

#[async_trait]
impl VectorIndex for UnreachableIndex {
    async fn namespace_exists(&self, _: &str) -> Result<bool, RagError> {
        Err(RagError::Index("connection refused".into()))
    }

    async fn upsert(&self, _: &str, _: Vec<EmbeddingChunk>) -> Result<(), RagError> {
        Err(RagError::Index("connection refused".into()))
    }

    async fn similarity_search(&self, _: &str, _: Vec<f32>, _: usize) -> Result<Vec<ChunkHit>, RagError> {
        Err(RagError::Index("connection refused".into()))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

struct Harness {
    store: Arc<MemoryDocumentStore>,
    fetcher: Arc<MemoryFetcher>,
    index: Arc<MemoryIndex>,
    embedder: Arc<CountingEmbedder>,
    ingestor: Arc<Ingestor>,
}

fn options() -> IngestOptions {
    IngestOptions {
        embedding_dim: None,
        embedding_concurrency: 3,
        call_timeout: Duration::from_secs(5),
        ingest_timeout: Duration::from_secs(30),
    }
}

fn harness(fetcher: MemoryFetcher) -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    let fetcher = Arc::new(fetcher);
    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(CountingEmbedder::default());
    let ingestor = Arc::new(Ingestor::new(
        store.clone(),
        fetcher.clone(),
        index.clone(),
        embedder.clone(),
        RecursiveSplitter::new(200, 40).unwrap(),
        options(),
    ));
    Harness {
        store,
        fetcher,
        index,
        embedder,
        ingestor,
    }
}

#[tokio::test]
async fn second_call_reuses_namespace() {
    let h = harness(MemoryFetcher::new().with_object(URL, handbook()));
    let doc = h.store.register_document("u1", "handbook", URL).await.unwrap();

    let first = h.ingestor.ensure_embedded("u1", &doc.id).await.unwrap();
    let IngestOutcome::Created { chunks } = first.outcome() else {
        panic!("expected a fresh namespace, got {:?}", first.outcome());
    };
    assert!(chunks > 1);
    assert_eq!(h.index.chunk_count(&doc.id).await, chunks);
    let embeds_after_first = h.embedder.calls.load(Ordering::SeqCst);
    assert_eq!(embeds_after_first, chunks);

    let second = h.ingestor.ensure_embedded("u1", &doc.id).await.unwrap();
    assert_eq!(second.outcome(), IngestOutcome::Reused);
    assert_eq!(h.index.batches_written(), 1);
    assert_eq!(h.fetcher.fetch_count(), 1);
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), embeds_after_first);
}

#[tokio::test]
async fn concurrent_first_calls_populate_once() {
    let h = harness(MemoryFetcher::new().with_object(URL, handbook()));
    let doc = h.store.register_document("u1", "handbook", URL).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let ingestor = h.ingestor.clone();
            let id = doc.id.clone();
            tokio::spawn(async move { ingestor.ensure_embedded("u1", &id).await })
        })
        .collect();

    let mut created = 0;
    for t in tasks {
        if let IngestOutcome::Created { .. } = t.await.unwrap().unwrap().outcome() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.index.batches_written(), 1);
    assert_eq!(h.fetcher.fetch_count(), 1);
}

#[tokio::test]
async fn retrieval_stays_inside_the_namespace() {
    let other_url = "mem://docs/recipes.txt";
    let h = harness(
        MemoryFetcher::new()
            .with_object(URL, handbook())
            .with_object(other_url, "Knead the dough for ten minutes and let it rest."),
    );
    let a = h.store.register_document("u1", "handbook", URL).await.unwrap();
    let b = h.store.register_document("u1", "recipes", other_url).await.unwrap();

    let handle = h.ingestor.ensure_embedded("u1", &a.id).await.unwrap();
    h.ingestor.ensure_embedded("u1", &b.id).await.unwrap();

    let hits = handle.retrieve("how long are returns accepted", 4).await.unwrap();
    assert!(!hits.is_empty() && hits.len() <= 4);
    assert!(hits.iter().all(|hit| !hit.text.contains("dough")));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn fetch_failure_leaves_namespace_absent() {
    let h = harness(MemoryFetcher::new().with_status(URL, 503));
    let doc = h.store.register_document("u1", "handbook", URL).await.unwrap();

    let err = h.ingestor.ensure_embedded("u1", &doc.id).await.unwrap_err();
    assert!(matches!(err, RagError::Fetch { status: 503, .. }), "{err}");
    assert!(!h.index.namespace_exists(&doc.id).await.unwrap());
    assert_eq!(h.index.batches_written(), 0);
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_or_foreign_document_is_not_found() {
    let h = harness(MemoryFetcher::new().with_object(URL, handbook()));
    let doc = h.store.register_document("owner", "handbook", URL).await.unwrap();

    let err = h.ingestor.ensure_embedded("intruder", &doc.id).await.unwrap_err();
    assert!(matches!(err, RagError::DocumentNotFound(_)), "{err}");
    let err = h.ingestor.ensure_embedded("owner", "missing").await.unwrap_err();
    assert!(matches!(err, RagError::DocumentNotFound(_)), "{err}");
    assert_eq!(h.fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn empty_document_is_rejected() {
    let h = harness(MemoryFetcher::new().with_object(URL, "  \n\n \x0C \n"));
    let doc = h.store.register_document("u1", "blank", URL).await.unwrap();

    let err = h.ingestor.ensure_embedded("u1", &doc.id).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyDocument), "{err}");
    assert!(!h.index.namespace_exists(&doc.id).await.unwrap());
}

#[tokio::test]
async fn unreachable_index_is_a_namespace_check_error() {
    let store = Arc::new(MemoryDocumentStore::new());
    let doc = store.register_document("u1", "handbook", URL).await.unwrap();
    let ingestor = Ingestor::new(
        store,
        Arc::new(MemoryFetcher::new().with_object(URL, handbook())),
        Arc::new(UnreachableIndex),
        Arc::new(HashingEmbedder::default()),
        RecursiveSplitter::new(200, 40).unwrap(),
        options(),
    );

    let err = ingestor.ensure_embedded("u1", &doc.id).await.unwrap_err();
    assert!(matches!(err, RagError::NamespaceCheck { .. }), "{err}");
}

#[tokio::test]
async fn server_files_never_reach_the_index() {
    let dir = std::env::temp_dir().join(format!("rag-ingest-local-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let secret = dir.join("server_secret.txt");
    tokio::fs::write(&secret, "DB_PASSWORD=hunter2 server side secret").await.unwrap();

    let store = Arc::new(MemoryDocumentStore::new());
    let index = Arc::new(MemoryIndex::new());
    let url = format!("file://{}", secret.display());
    let doc = store.register_document("u1", "secret", &url).await.unwrap();
    let ingestor = Ingestor::new(
        store,
        Arc::new(HttpFetcher::new(Duration::from_secs(1)).unwrap()),
        index.clone(),
        Arc::new(HashingEmbedder::default()),
        RecursiveSplitter::new(200, 40).unwrap(),
        options(),
    );

    let err = ingestor.ensure_embedded("u1", &doc.id).await.unwrap_err();
    assert!(matches!(err, RagError::UnsupportedUrl(_)), "{err}");
    assert!(!index.namespace_exists(&doc.id).await.unwrap());
    assert_eq!(index.chunk_count(&doc.id).await, 0);
    let _ = tokio::fs::remove_dir_all(&dir).await;
}
