//! Provider-agnostic chat messages and the language-model seam.
//!
//! Callers build an ordered `[ChatMessage]` (system, history, user) and hand
//! it to any [`LanguageModel`]. The concrete [`ProfileModel`] routes the
//! request to one profile of a shared [`LlmServiceProfiles`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error_handler::AiLlmError, service_profiles::LlmServiceProfiles};

/// Speaker of a chat message. Serialised the way both Ollama and OpenAI expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Anything that turns an ordered list of messages into one reply.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends `messages` and returns the assistant reply text.
    ///
    /// # Errors
    /// Transport, status, decode or timeout failures of the backend.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError>;

    /// Short label for logs.
    fn label(&self) -> &str {
        "language-model"
    }
}

/// Which generation profile a [`ProfileModel`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Fast,
    Slow,
}

/// [`LanguageModel`] backed by one profile of a shared [`LlmServiceProfiles`].
#[derive(Clone)]
pub struct ProfileModel {
    svc: Arc<LlmServiceProfiles>,
    profile: Profile,
}

impl ProfileModel {
    pub fn new(svc: Arc<LlmServiceProfiles>, profile: Profile) -> Self {
        Self { svc, profile }
    }
}

#[async_trait]
impl LanguageModel for ProfileModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        match self.profile {
            Profile::Fast => self.svc.chat_fast(messages).await,
            Profile::Slow => self.svc.chat_slow(messages).await,
        }
    }

    fn label(&self) -> &str {
        match self.profile {
            Profile::Fast => "fast",
            Profile::Slow => "slow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialise_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
