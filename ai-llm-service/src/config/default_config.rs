//! Default LLM configs loaded from environment variables.
//!
//! Three roles per provider:
//!
//! - **Fast**      → query rewriting (cheap, low latency)
//! - **Slow**      → grounded answer generation (quality)
//! - **Embedding** → chunk and query vectors
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = `ollama` | `openai` (default `ollama`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` (required)
//! - `OLLAMA_MODEL` (required), `OLLAMA_MODEL_FAST` (defaults to `OLLAMA_MODEL`)
//! - `EMBEDDING_MODEL` (required)
//!
//! OpenAI:
//! - `OPENAI_API_KEY` (required)
//! - `OPENAI_URL` (default `https://api.openai.com`)
//! - `OPENAI_MODEL` (default `gpt-4o`), `OPENAI_MODEL_FAST` (defaults to `OPENAI_MODEL`)
//! - `EMBEDDING_MODEL` (default `text-embedding-ada-002`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The three profiles consumed by [`crate::LlmServiceProfiles`].
#[derive(Debug, Clone)]
pub struct ProfileConfigs {
    pub fast: LlmModelConfig,
    pub slow: Option<LlmModelConfig>,
    pub embedding: LlmModelConfig,
}

/// Reads `LLM_KIND` and builds all three profiles for that provider.
///
/// # Errors
/// Any [`ConfigError`] raised while reading the provider-specific variables.
pub fn profiles_from_env() -> Result<ProfileConfigs, AiLlmError> {
    let provider = match opt_env("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Ollama,
    };

    match provider {
        LlmProvider::Ollama => Ok(ProfileConfigs {
            fast: config_ollama_fast()?,
            slow: Some(config_ollama_slow()?),
            embedding: config_ollama_embedding()?,
        }),
        LlmProvider::OpenAI => Ok(ProfileConfigs {
            fast: config_openai_fast()?,
            slow: Some(config_openai_slow()?),
            embedding: config_openai_embedding()?,
        }),
    }
}

/* --------------------------------- Ollama --------------------------------- */

/// Resolves the Ollama endpoint.
///
/// Precedence: `OLLAMA_URL`, then `OLLAMA_PORT` → `http://localhost:{port}`.
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", url.trim())?;
        return Ok(url.trim().to_string());
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Slow/quality Ollama model (`OLLAMA_MODEL`), temperature 0.2.
pub fn config_ollama_slow() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(600)),
    })
}

/// Fast Ollama model (`OLLAMA_MODEL_FAST`, falls back to `OLLAMA_MODEL`).
///
/// Query rewriting should be reproducible, so the temperature is 0.
pub fn config_ollama_fast() -> Result<LlmModelConfig, AiLlmError> {
    let model = match opt_env("OLLAMA_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OLLAMA_MODEL")?,
    };
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(120)),
    })
}

/// Embedding Ollama model (`EMBEDDING_MODEL`).
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}

/* --------------------------------- OpenAI --------------------------------- */

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", url.trim())?;
    Ok(url.trim().to_string())
}

fn openai_model() -> String {
    opt_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
}

/// Answer model (`OPENAI_MODEL`, default `gpt-4o`), temperature 0.
pub fn config_openai_slow() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: openai_model(),
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(120)),
    })
}

/// Rewrite model (`OPENAI_MODEL_FAST`, falls back to `OPENAI_MODEL`).
pub fn config_openai_fast() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        model: opt_env("OPENAI_MODEL_FAST").unwrap_or_else(openai_model),
        ..config_openai_slow()?
    })
}

pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("EMBEDDING_MODEL")
            .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}
