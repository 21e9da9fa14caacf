use serde::Deserialize;

/// Request payload for `POST /documents/{id}/ask`.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question about the document.
    pub question: String,
}
