use async_trait::async_trait;

use crate::{
    errors::StoreError,
    models::{ChatTurn, Document, UserPlan},
};

/// Persistence seam for documents, their chat logs and user plans.
///
/// Implementations must keep each document's chat log append-only with
/// insertion order equal to `created_at` order: a turn whose timestamp is
/// older than the last stored one is stamped with the last timestamp.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Records a new document for `user_id`.
    async fn register_document(
        &self,
        user_id: &str,
        name: &str,
        download_url: &str,
    ) -> Result<Document, StoreError>;

    /// # Errors
    /// [`StoreError::DocumentNotFound`] if missing or owned by another user.
    async fn get_document(&self, user_id: &str, document_id: &str) -> Result<Document, StoreError>;

    /// Full chat log, oldest first.
    async fn chat_turns(&self, user_id: &str, document_id: &str)
    -> Result<Vec<ChatTurn>, StoreError>;

    /// Up to `limit` turns, **most recent first**.
    async fn recent_chat_turns(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError>;

    /// Appends one turn and returns it as stored.
    async fn append_chat_turn(
        &self,
        user_id: &str,
        document_id: &str,
        turn: ChatTurn,
    ) -> Result<ChatTurn, StoreError>;

    /// Unknown users are on the free tier.
    async fn user_plan(&self, user_id: &str) -> Result<UserPlan, StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}
