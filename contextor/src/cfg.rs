//! Runtime configuration loaded from environment variables.

use std::{str::FromStr, time::Duration};

use crate::error::ContextorError;

/// Knobs for quota, history and the answer pipeline. Defaults via [`Default`].
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Recent turns fed to the rewrite and answer prompts.
    pub history_limit: usize,
    /// Character budget of the context block.
    pub max_ctx_chars: usize,
    /// Bound for each store or model call.
    pub call_timeout: Duration,
    pub free_question_limit: usize,
    pub pro_question_limit: usize,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            history_limit: doc_store::DEFAULT_HISTORY_LIMIT,
            max_ctx_chars: 12_000,
            call_timeout: Duration::from_secs(60),
            free_question_limit: 4,
            pro_question_limit: 20,
        }
    }
}

impl ContextorConfig {
    /// Reads `RAG_TOP_K`, `HISTORY_LIMIT`, `MAX_CTX_CHARS`,
    /// `CALL_TIMEOUT_SECS`, `FREE_QUESTION_LIMIT` and `PRO_QUESTION_LIMIT`.
    ///
    /// # Errors
    /// [`ContextorError::Config`] on unparsable or zero values.
    pub fn from_env() -> Result<Self, ContextorError> {
        let d = Self::default();
        let cfg = Self {
            top_k: parse("RAG_TOP_K", d.top_k)?,
            history_limit: parse("HISTORY_LIMIT", d.history_limit)?,
            max_ctx_chars: parse("MAX_CTX_CHARS", d.max_ctx_chars)?,
            call_timeout: Duration::from_secs(parse("CALL_TIMEOUT_SECS", d.call_timeout.as_secs())?),
            free_question_limit: parse("FREE_QUESTION_LIMIT", d.free_question_limit)?,
            pro_question_limit: parse("PRO_QUESTION_LIMIT", d.pro_question_limit)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.max_ctx_chars == 0 {
            return Err(ContextorError::Config("MAX_CTX_CHARS must be > 0".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(ContextorError::Config("CALL_TIMEOUT_SECS must be > 0".into()));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(k: &str, dflt: T) -> Result<T, ContextorError> {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ContextorError::Config(format!("{k} has an invalid value `{v}`"))),
        _ => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ContextorConfig::default();
        cfg.validate().unwrap();
        assert_eq!((cfg.top_k, cfg.history_limit), (4, 10));
        assert_eq!((cfg.free_question_limit, cfg.pro_question_limit), (4, 20));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let cfg = ContextorConfig {
            top_k: 0,
            ..ContextorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ContextorError::Config(_))));
    }
}
