//! Health probes for LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, model looked up in `models[].name`
//! - OpenAI: `GET {endpoint}/v1/models` (Bearer auth), model looked up in `data[].id`
//!
//! [`HealthService::check`] never fails: errors become `ok=false` snapshots
//! suitable for a `/health` endpoint.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// Serializable health snapshot for a single profile.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// # Errors
    /// [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!(default_timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks one profile. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        if !cfg.has_http_endpoint() {
            warn!(provider = ?cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let started = Instant::now();
        let status = match self.probe(cfg).await {
            Ok((found, listed)) => {
                let latency = started.elapsed().as_millis();
                match (found, listed) {
                    (true, _) => HealthStatus::new(cfg, true, latency, "healthy; model is available"),
                    (false, true) => {
                        HealthStatus::new(cfg, false, latency, "reachable, but model is not listed")
                    }
                    (false, false) => {
                        HealthStatus::new(cfg, true, latency, "reachable; model list unavailable")
                    }
                }
            }
            Err(err) => HealthStatus::new(cfg, false, started.elapsed().as_millis(), err.to_string()),
        };

        info!(
            provider = %status.provider,
            model = %status.model,
            ok = status.ok,
            latency_ms = status.latency_ms,
            "health probe completed"
        );
        status
    }

    /// Checks several profiles sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Returns `(model_found, model_list_decoded)`.
    async fn probe(&self, cfg: &LlmModelConfig) -> Result<(bool, bool), AiLlmError> {
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        let (url, mut req) = match cfg.provider {
            LlmProvider::Ollama => {
                let url = format!("{}/api/tags", cfg.base_url());
                let req = self.client.get(&url);
                (url, req)
            }
            LlmProvider::OpenAI => {
                let key = cfg
                    .api_key
                    .as_deref()
                    .ok_or_else(|| HealthError::Decode("missing OpenAI API key".into()))?;
                let url = format!("{}/v1/models", cfg.base_url());
                let req = self
                    .client
                    .get(&url)
                    .header(header::AUTHORIZATION, format!("Bearer {key}"));
                (url, req)
            }
        };
        req = req.timeout(timeout);

        let resp = req.send().await.map_err(|e| AiLlmError::from_send(e, timeout))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(HealthError::HttpStatus(HttpError { status, url, snippet }).into());
        }

        let body = resp.text().await.map_err(AiLlmError::from)?;
        let names = match cfg.provider {
            LlmProvider::Ollama => serde_json::from_str::<OllamaTags>(&body)
                .ok()
                .and_then(|t| t.models)
                .map(|m| m.into_iter().map(|t| t.name).collect::<Vec<_>>()),
            LlmProvider::OpenAI => serde_json::from_str::<OpenAiModels>(&body)
                .ok()
                .map(|m| m.data.into_iter().map(|i| i.id).collect::<Vec<_>>()),
        };

        Ok(match names {
            Some(list) => (list.iter().any(|n| n == &cfg.model), true),
            None => (false, false),
        })
    }
}

#[derive(Deserialize)]
struct OllamaTags {
    models: Option<Vec<OllamaTag>>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}

#[derive(Deserialize)]
struct OpenAiModels {
    data: Vec<OpenAiModel>,
}

#[derive(Deserialize)]
struct OpenAiModel {
    id: String,
}
