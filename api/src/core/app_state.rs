use std::sync::Arc;

use ai_llm_service::{LlmServiceProfiles, Profile, ProfileModel};
use contextor::{AskService, ContextorConfig};
use doc_store::{DocStoreConfig, DocumentStore, open_store};
use rag_store::{HttpFetcher, Ingestor, LlmEmbedder, RagConfig, build_index};
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub ask: Arc<AskService>,
    /// LLM profiles probed by `/health`; `None` when models are injected directly.
    pub llm: Option<Arc<LlmServiceProfiles>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ask: Arc<AskService>,
        llm: Option<Arc<LlmServiceProfiles>>,
    ) -> Self {
        Self { store, ask, llm }
    }

    /// Wires every collaborator from environment variables.
    ///
    /// # Errors
    /// [`AppError::Config`] when any crate rejects its configuration.
    pub fn from_env() -> Result<Self, AppError> {
        let store_cfg = DocStoreConfig::from_env().map_err(AppError::config)?;
        let store = open_store(&store_cfg).map_err(AppError::config)?;

        let rag_cfg = RagConfig::from_env().map_err(AppError::config)?;
        let index = build_index(&rag_cfg).map_err(AppError::config)?;

        let svc = Arc::new(LlmServiceProfiles::from_env().map_err(AppError::config)?);
        let embedder = Arc::new(LlmEmbedder::new(Arc::clone(&svc), rag_cfg.embedding_dim));
        let fetcher = Arc::new(HttpFetcher::new(rag_cfg.call_timeout).map_err(AppError::config)?);

        let ingestor = Ingestor::from_config(&rag_cfg, Arc::clone(&store), fetcher, index, embedder)
            .map_err(AppError::config)?;

        let ctx_cfg = ContextorConfig::from_env().map_err(AppError::config)?;
        let ask = AskService::new(
            Arc::clone(&store),
            Arc::new(ingestor),
            Arc::new(ProfileModel::new(Arc::clone(&svc), Profile::Fast)),
            Arc::new(ProfileModel::new(Arc::clone(&svc), Profile::Slow)),
            ctx_cfg,
        );

        info!(
            store = store.backend(),
            index = ?rag_cfg.index,
            collection = %rag_cfg.collection,
            "application state ready"
        );
        Ok(Self::new(store, Arc::new(ask), Some(svc)))
    }
}
