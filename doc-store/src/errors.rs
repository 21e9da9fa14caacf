use thiserror::Error;

/// Errors produced by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document does not exist or belongs to another user.
    #[error("[Doc Store] document not found: {document_id}")]
    DocumentNotFound { document_id: String },

    #[error("[Doc Store] sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("[Doc Store] io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking worker panicked or was cancelled.
    #[error("[Doc Store] background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Backend cannot serve requests (e.g. poisoned connection lock).
    #[error("[Doc Store] store unavailable: {0}")]
    Unavailable(String),

    #[error("[Doc Store] invalid config: {0}")]
    Config(String),
}

impl StoreError {
    pub fn not_found(document_id: &str) -> Self {
        StoreError::DocumentNotFound {
            document_id: document_id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::DocumentNotFound { .. })
    }
}
