//! GET /documents/{id}/chat - the document's chat log, oldest first.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use doc_store::ChatTurn;

use crate::{
    core::{app_state::AppState, user_id::UserId},
    error_handler::AppResult,
};

pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(document_id): Path<String>,
) -> AppResult<Json<Vec<ChatTurn>>> {
    let turns = state.ask.chat_log(&user_id, &document_id).await?;
    Ok(Json(turns))
}
