use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use doc_store::StoreError;
use thiserror::Error;

use crate::core::http::response_envelope::ErrorEnvelope;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("document not found")]
    NotFound,

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn config(err: impl std::fmt::Display) -> Self {
        AppError::Config(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Http { status, .. } => *status,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound => "DOCUMENT_NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }
}

/// HTTP status for a core failure code.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "DOCUMENT_NOT_FOUND" => StatusCode::NOT_FOUND,
        "TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ErrorEnvelope::new(self.error_code(), self.to_string()).into_response(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            return AppError::NotFound;
        }
        AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "STORAGE_ERROR",
            message: err.to_string(),
        }
    }
}

impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        if err.is_not_found() {
            return AppError::NotFound;
        }
        let code = err.code();
        AppError::Http {
            status: status_for_code(code),
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_codes_map_to_statuses() {
        assert_eq!(status_for_code("DOCUMENT_NOT_FOUND"), StatusCode::NOT_FOUND);
        assert_eq!(status_for_code("TIMEOUT"), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for_code("FETCH_ERROR"), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_document_is_404() {
        let e = AppError::from(StoreError::not_found("d1"));
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(e.error_code(), "DOCUMENT_NOT_FOUND");
    }
}
