//! Chat History Store Adapter.
//!
//! Wraps a [`DocumentStore`] with the history contract used by the
//! orchestrator: `recent` returns up to `limit` turns **most recent first**
//! and callers reverse them with [`ChatHistory::chronological`] before
//! building prompts.

use std::sync::Arc;

use tracing::debug;

use crate::{errors::StoreError, models::ChatTurn, store::DocumentStore};

/// Default size of the recent-history window.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ChatHistory {
    store: Arc<dyn DocumentStore>,
    limit: usize,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Appends one turn.
    ///
    /// # Errors
    /// [`StoreError::DocumentNotFound`] if the document is missing or not
    /// owned by `user_id`; backend errors otherwise.
    pub async fn append(
        &self,
        user_id: &str,
        document_id: &str,
        turn: ChatTurn,
    ) -> Result<ChatTurn, StoreError> {
        debug!(document_id, role = turn.role.as_str(), "appending chat turn");
        self.store.append_chat_turn(user_id, document_id, turn).await
    }

    /// Up to `limit` turns in descending creation order.
    pub async fn recent(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        self.store
            .recent_chat_turns(user_id, document_id, limit)
            .await
    }

    /// [`ChatHistory::recent`] with the configured window.
    pub async fn recent_window(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        self.recent(user_id, document_id, self.limit).await
    }

    /// Whole log, oldest first.
    pub async fn all(&self, user_id: &str, document_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        self.store.chat_turns(user_id, document_id).await
    }

    /// Reverses a most-recent-first window into prompt order.
    pub fn chronological(mut recent: Vec<ChatTurn>) -> Vec<ChatTurn> {
        recent.reverse();
        recent
    }
}
