use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat turn.
///
/// Stored as `"human"` / `"assistant"`; `"ai"` is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    #[serde(alias = "ai")]
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "human" => Some(Role::Human),
            "assistant" | "ai" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One immutable message in a document's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: Role, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn human(message: impl Into<String>) -> Self {
        Self::new(Role::Human, message)
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self::new(Role::Assistant, message)
    }

    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
}

/// Uploaded file record. `id` doubles as the embedding namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
}

/// Plan information consumed by the quota policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPlan {
    pub has_active_membership: bool,
}
