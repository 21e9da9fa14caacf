use chrono::{DateTime, Utc};
use doc_store::Document;
use serde::{Deserialize, Serialize};

/// Request payload for `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct RegisterDocumentRequest {
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// `http(s)://` location of the uploaded file.
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub name: String,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            name: d.name,
            download_url: d.download_url,
            created_at: d.created_at,
        }
    }
}
