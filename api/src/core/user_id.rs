//! Caller identity taken from the `X-User-Id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error_handler::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated caller, passed explicitly to every core operation.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or_else(|| AppError::BadRequest(format!("missing {USER_ID_HEADER} header")))
    }
}
