//! In-process document store.
//!
//! Everything lives behind one `tokio::sync::RwLock`; chat logs are plain
//! `Vec`s so insertion order is the storage order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    errors::StoreError,
    models::{ChatTurn, Document, UserPlan},
    store::DocumentStore,
};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, Document>,
    chats: HashMap<String, Vec<ChatTurn>>,
    memberships: HashMap<String, bool>,
}

impl Inner {
    fn owned(&self, user_id: &str, document_id: &str) -> Result<&Document, StoreError> {
        self.documents
            .get(document_id)
            .filter(|d| d.owner_id == user_id)
            .ok_or_else(|| StoreError::not_found(document_id))
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the membership flag reported by [`DocumentStore::user_plan`].
    pub async fn set_membership(&self, user_id: &str, active: bool) {
        self.inner
            .write()
            .await
            .memberships
            .insert(user_id.to_string(), active);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn register_document(
        &self,
        user_id: &str,
        name: &str,
        download_url: &str,
    ) -> Result<Document, StoreError> {
        let doc = Document {
            id: services::uuid::new_id(),
            owner_id: user_id.to_string(),
            name: name.to_string(),
            download_url: download_url.to_string(),
            created_at: Utc::now(),
        };
        let mut w = self.inner.write().await;
        w.documents.insert(doc.id.clone(), doc.clone());
        w.chats.insert(doc.id.clone(), Vec::new());
        debug!(document_id = %doc.id, user_id, "document registered");
        Ok(doc)
    }

    async fn get_document(&self, user_id: &str, document_id: &str) -> Result<Document, StoreError> {
        self.inner.read().await.owned(user_id, document_id).cloned()
    }

    async fn chat_turns(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let r = self.inner.read().await;
        r.owned(user_id, document_id)?;
        Ok(r.chats.get(document_id).cloned().unwrap_or_default())
    }

    async fn recent_chat_turns(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let r = self.inner.read().await;
        r.owned(user_id, document_id)?;
        Ok(r.chats
            .get(document_id)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn append_chat_turn(
        &self,
        user_id: &str,
        document_id: &str,
        mut turn: ChatTurn,
    ) -> Result<ChatTurn, StoreError> {
        let mut w = self.inner.write().await;
        w.owned(user_id, document_id)?;
        let log = w.chats.entry(document_id.to_string()).or_default();
        if let Some(last) = log.last() {
            if turn.created_at < last.created_at {
                turn.created_at = last.created_at;
            }
        }
        log.push(turn.clone());
        Ok(turn)
    }

    async fn user_plan(&self, user_id: &str) -> Result<UserPlan, StoreError> {
        let active = self
            .inner
            .read()
            .await
            .memberships
            .get(user_id)
            .copied()
            .unwrap_or(false);
        Ok(UserPlan {
            has_active_membership: active,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    #[tokio::test]
    async fn foreign_documents_are_not_found() {
        let store = MemoryDocumentStore::new();
        let doc = store.register_document("alice", "a.pdf", "http://x/a.pdf").await.unwrap();

        let err = store.get_document("bob", &doc.id).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .append_chat_turn("bob", &doc.id, ChatTurn::human("hi"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.chat_turns("alice", &doc.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backdated_turns_keep_log_monotonic() {
        let store = MemoryDocumentStore::new();
        let doc = store.register_document("u", "a.pdf", "http://x/a.pdf").await.unwrap();

        let first = store
            .append_chat_turn("u", &doc.id, ChatTurn::human("q1"))
            .await
            .unwrap();
        let mut late = ChatTurn::assistant("a1");
        late.created_at = first.created_at - Duration::seconds(5);
        let stored = store.append_chat_turn("u", &doc.id, late).await.unwrap();

        assert_eq!(stored.created_at, first.created_at);
        let log = store.chat_turns("u", &doc.id).await.unwrap();
        assert_eq!(log.iter().map(|t| t.role).collect::<Vec<_>>(), [Role::Human, Role::Assistant]);
    }

    #[tokio::test]
    async fn plans_default_to_free() {
        let store = MemoryDocumentStore::new();
        assert!(!store.user_plan("nobody").await.unwrap().has_active_membership);
        store.set_membership("pro", true).await;
        assert!(store.user_plan("pro").await.unwrap().has_active_membership);
    }
}
