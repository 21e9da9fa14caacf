//! POST /documents - records an already uploaded file for the caller.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    core::{app_state::AppState, user_id::UserId},
    error_handler::{AppError, AppResult},
    routes::documents::register_document_request::{DocumentResponse, RegisterDocumentRequest},
};

/// Handler: POST /documents
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/documents \
///   -H 'content-type: application/json' -H 'x-user-id: u1' \
///   -d '{"name":"manual.pdf","download_url":"https://files.example.com/manual.pdf"}'
/// ```
pub async fn register_document(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(body): Json<RegisterDocumentRequest>,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let name = body.name.trim();
    let url = body.download_url.trim();
    if name.is_empty() || url.is_empty() {
        return Err(AppError::BadRequest(
            "`name` and `download_url` must not be blank".into(),
        ));
    }
    rag_store::check_object_url(url).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let doc = state.store.register_document(&user_id, name, url).await?;
    info!(%user_id, document_id = %doc.id, "document registered");
    Ok((StatusCode::CREATED, Json(doc.into())))
}
