//! Public API types re-used by external crates (e.g., the HTTP API layer).

use rag_store::ChunkHit;
use serde::Serialize;

use crate::error::ContextorError;

/// Shown for every infrastructure failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while answering your question. Please try again.";

/// Final answer together with the search query and the context fed to the model.
#[derive(Clone, Debug, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    /// Standalone query used for retrieval.
    pub query: String,
    pub context: Vec<ChunkHit>,
}

/// Normal (non-error) outcomes of one `ask`.
#[derive(Clone, Debug)]
pub enum AskOutcome {
    Answered(QaAnswer),
    QuotaExceeded { message: String },
}

/// `{ success, message }` rendering of an `ask` call.
///
/// # Example
/// ```
/// use contextor::{AskOutcome, AskResult};
/// let r = AskResult::from(Ok(AskOutcome::QuotaExceeded { message: "limit".into() }));
/// assert!(!r.success);
/// assert_eq!(r.message.as_deref(), Some("limit"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AskResult {
    pub success: bool,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl From<Result<AskOutcome, ContextorError>> for AskResult {
    fn from(res: Result<AskOutcome, ContextorError>) -> Self {
        match res {
            Ok(AskOutcome::Answered(qa)) => AskResult {
                success: true,
                message: None,
                code: None,
                answer: Some(qa.answer),
            },
            Ok(AskOutcome::QuotaExceeded { message }) => AskResult {
                success: false,
                message: Some(message),
                code: None,
                answer: None,
            },
            Err(e) => AskResult {
                success: false,
                message: Some(GENERIC_FAILURE_MESSAGE.to_string()),
                code: Some(e.code()),
                answer: None,
            },
        }
    }
}
