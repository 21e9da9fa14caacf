//! JSON body for every non-ask failure: `{ "success": false, "error": { .. } }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable code such as `BAD_REQUEST` or `DOCUMENT_NOT_FOUND`.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldHint>,
}

/// Request field a rejection most likely refers to.
#[derive(Debug, Serialize)]
pub struct FieldHint {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
                fields: Vec::new(),
            },
        }
    }

    pub fn with_field(mut self, hint: FieldHint) -> Self {
        self.error.fields.push(hint);
        self
    }

    pub fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_failure_shape() {
        let env = ErrorEnvelope::new("BAD_REQUEST", "missing field").with_field(FieldHint {
            field: "question".into(),
            hint: None,
        });
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "BAD_REQUEST");
        assert_eq!(v["error"]["fields"][0]["field"], "question");
        assert!(v["error"]["fields"][0].get("hint").is_none());

        let bare = serde_json::to_value(ErrorEnvelope::new("NOT_FOUND", "gone")).unwrap();
        assert!(bare["error"].get("fields").is_none());
    }
}
