//! Typed error for the contextor crate.
//!
//! Quota denial is not an error (see [`crate::AskOutcome::QuotaExceeded`]);
//! every variant here is an infrastructure failure with a stable
//! [`ContextorError::code`].

use ai_llm_service::AiLlmError;
use doc_store::StoreError;
use rag_store::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Ingestion or vector index failures.
    #[error("[Contextor] {0}")]
    Rag(#[from] RagError),

    /// Document store failures.
    #[error("[Contextor] {0}")]
    Store(#[from] StoreError),

    /// Model call or retrieval failure inside the answer pipeline.
    #[error("[Contextor] generation failed: {0}")]
    Generation(String),

    #[error("[Contextor] {op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },

    #[error("[Contextor] config error: {0}")]
    Config(String),
}

impl ContextorError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ContextorError::Rag(e) => match e {
                RagError::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
                RagError::Fetch { .. } | RagError::Transport(_) | RagError::UnsupportedUrl(_) => {
                    "FETCH_ERROR"
                }
                RagError::Parse(_) | RagError::EmptyDocument => "PARSE_ERROR",
                RagError::NamespaceCheck { .. } => "NAMESPACE_CHECK_ERROR",
                RagError::Embedding(_) | RagError::VectorSizeMismatch { .. } => "EMBEDDING_ERROR",
                RagError::Timeout { .. } => "TIMEOUT",
                RagError::Index(_) | RagError::Config(_) | RagError::Store(_) => "STORAGE_ERROR",
            },
            ContextorError::Store(e) if e.is_not_found() => "DOCUMENT_NOT_FOUND",
            ContextorError::Store(_) => "STORAGE_ERROR",
            ContextorError::Generation(_) => "GENERATION_ERROR",
            ContextorError::Timeout { .. } => "TIMEOUT",
            ContextorError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "DOCUMENT_NOT_FOUND"
    }

    pub fn is_timeout(&self) -> bool {
        self.code() == "TIMEOUT"
    }

    /// Model failures keep their deadline semantics; everything else is generation.
    pub(crate) fn from_model(op: &'static str, err: AiLlmError) -> Self {
        match err {
            AiLlmError::Timeout(d) => ContextorError::Timeout {
                op,
                secs: d.as_secs(),
            },
            other => ContextorError::Generation(other.to_string()),
        }
    }

    /// Retrieval failures inside the answer pipeline surface as generation errors.
    pub(crate) fn from_retrieval(err: RagError) -> Self {
        match err {
            RagError::Timeout { op, secs } => ContextorError::Timeout { op, secs },
            other => ContextorError::Generation(format!("retrieval failed: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_failure_taxonomy() {
        let fetch = ContextorError::from(RagError::Fetch {
            status: 503,
            url: "mem://x".into(),
            snippet: String::new(),
        });
        assert_eq!(fetch.code(), "FETCH_ERROR");
        let local = ContextorError::from(RagError::UnsupportedUrl("file:///etc/passwd".into()));
        assert_eq!(local.code(), "FETCH_ERROR");

        let unreadable = ContextorError::from(RagError::Parse("bad xref table".into()));
        assert_eq!(unreadable.code(), "PARSE_ERROR");
        assert_eq!(ContextorError::from(RagError::EmptyDocument).code(), "PARSE_ERROR");

        let missing = ContextorError::from(StoreError::not_found("d1"));
        assert_eq!(missing.code(), "DOCUMENT_NOT_FOUND");
        assert!(missing.is_not_found());

        let ns = ContextorError::from(RagError::NamespaceCheck {
            namespace: "d1".into(),
            reason: "down".into(),
        });
        assert_eq!(ns.code(), "NAMESPACE_CHECK_ERROR");

        let emb = ContextorError::from(RagError::VectorSizeMismatch { got: 3, want: 4 });
        assert_eq!(emb.code(), "EMBEDDING_ERROR");

        assert_eq!(ContextorError::from(RagError::Index("x".into())).code(), "STORAGE_ERROR");
    }

    #[test]
    fn retrieval_failures_become_generation_errors() {
        let e = ContextorError::from_retrieval(RagError::Index("down".into()));
        assert_eq!(e.code(), "GENERATION_ERROR");

        let t = ContextorError::from_retrieval(RagError::Timeout {
            op: "similarity search",
            secs: 5,
        });
        assert!(t.is_timeout());
    }
}
