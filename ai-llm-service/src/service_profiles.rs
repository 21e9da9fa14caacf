//! Shared LLM service with three profiles: `fast`, `slow`, and `embedding`.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches provider clients per config (endpoint+model+key+timeout).
//! - If the `slow` profile is not provided, it falls back to `fast`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{ChatMessage, LlmServiceProfiles};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//! let reply = svc.chat_fast(&[ChatMessage::user("Hello")]).await?;
//! let vector = svc.embed("Ferris").await?;
//! println!("{reply} / dim={}", vector.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    chat::ChatMessage,
    config::{
        default_config::profiles_from_env, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, env_opt_u64},
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

pub struct LlmServiceProfiles {
    fast: LlmModelConfig,
    slow: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with three profiles.
    ///
    /// - `fast`: query-rewrite profile.
    /// - `slow_opt`: answer profile; `None` falls back to `fast`.
    /// - `embedding`: embedding profile.
    /// - `health_timeout_secs`: timeout for health probes (default 10).
    ///
    /// # Errors
    /// [`AiLlmError::HttpTransport`] if the health client cannot be built.
    pub fn new(
        fast: LlmModelConfig,
        slow_opt: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let slow = slow_opt.unwrap_or_else(|| fast.clone());
        Ok(Self {
            fast,
            slow,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds all profiles from environment variables
    /// (see [`crate::config::default_config`]); `LLM_HEALTH_TIMEOUT_SECS`
    /// overrides the probe timeout.
    pub fn from_env() -> Result<Self, AiLlmError> {
        let cfg = profiles_from_env()?;
        Self::new(
            cfg.fast,
            cfg.slow,
            cfg.embedding,
            env_opt_u64("LLM_HEALTH_TIMEOUT_SECS")?,
        )
    }

    /// Chat completion with the **fast** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails.
    pub async fn chat_fast(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.chat_with(&self.fast, messages).await
    }

    /// Chat completion with the **slow** profile.
    pub async fn chat_slow(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.chat_with(&self.slow, messages).await
    }

    /// Computes one embedding vector with the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self.embedding.provider {
            LlmProvider::Ollama => self.ollama_for(&self.embedding).await?.embeddings(input).await,
            LlmProvider::OpenAI => self.openai_for(&self.embedding).await?.embeddings(input).await,
        }
    }

    /// Health snapshot for all distinct profiles; never fails.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(3);
        list.push(self.fast.clone());
        if self.slow != self.fast {
            list.push(self.slow.clone());
        }
        if self.embedding != self.fast && self.embedding != self.slow {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /* --------------------- Internals --------------------- */

    async fn chat_with(
        &self,
        cfg: &LlmModelConfig,
        messages: &[ChatMessage],
    ) -> Result<String, AiLlmError> {
        debug!(provider = ?cfg.provider, model = %cfg.model, messages = messages.len(), "chat request");
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.chat(messages).await,
            LlmProvider::OpenAI => self.openai_for(cfg).await?.chat(messages).await,
        }
    }

    async fn ollama_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn openai_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Cache key identifying one client configuration.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
