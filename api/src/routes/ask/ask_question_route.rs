//! POST /documents/{id}/ask - asks a question about one document.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::AskResult;
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, user_id::UserId},
    error_handler::{AppError, status_for_code},
    routes::ask::ask_request::AskRequest,
};

/// Handler: POST /documents/{id}/ask
///
/// Quota denial answers `200` with `success: false`; infrastructure
/// failures answer `404`/`502`/`504` with the same body shape.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/documents/$DOC/ask \
///   -H 'content-type: application/json' -H 'x-user-id: u1' \
///   -d '{"question":"What is this document about?"}'
/// ```
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(document_id): Path<String>,
    Json(body): Json<AskRequest>,
) -> Response {
    let question = body.question.trim();
    if question.is_empty() {
        return AppError::BadRequest("`question` must not be blank".into()).into_response();
    }

    let res = state.ask.ask(&user_id, &document_id, question).await;
    let status = match &res {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            error!(%document_id, code = e.code(), error = %e, "ask failed");
            status_for_code(e.code())
        }
    };

    let result = AskResult::from(res);
    debug!(%document_id, success = result.success, "ask finished");
    (status, Json(result)).into_response()
}
