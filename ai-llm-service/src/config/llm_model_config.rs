use crate::config::llm_provider::LlmProvider;

/// Configuration for one model profile.
///
/// - `provider`: which backend serves the model.
/// - `model`: model identifier (e.g. `"gpt-4o"`, `"qwen3:14b"`).
/// - `endpoint`: base URL without the API path (e.g. `http://localhost:11434`).
/// - `api_key`: required for OpenAI, ignored for Ollama.
/// - `max_tokens`, `temperature`, `top_p`: sampling options, sent only when set.
/// - `timeout_secs`: per-request HTTP timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint with trailing slashes removed, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }

    /// Returns `true` when the endpoint is non-empty and uses http/https.
    pub fn has_http_endpoint(&self) -> bool {
        let e = self.endpoint.trim();
        !e.is_empty() && (e.starts_with("http://") || e.starts_with("https://"))
    }
}
