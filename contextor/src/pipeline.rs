//! Retrieval-augmented answer pipeline: rewrite -> retrieve -> answer.

use std::{future::Future, sync::Arc, time::Duration};

use ai_llm_service::{ChatMessage, LanguageModel};
use doc_store::ChatTurn;
use rag_store::Ingestor;
use tracing::{debug, info, instrument};

use crate::{api_types::QaAnswer, cfg::ContextorConfig, error::ContextorError, prompt};

pub struct AnswerPipeline {
    ingestor: Arc<Ingestor>,
    /// Cheap model for query rewriting.
    rewriter: Arc<dyn LanguageModel>,
    answerer: Arc<dyn LanguageModel>,
    top_k: usize,
    max_ctx_chars: usize,
    call_timeout: Duration,
}

impl AnswerPipeline {
    pub fn new(
        ingestor: Arc<Ingestor>,
        rewriter: Arc<dyn LanguageModel>,
        answerer: Arc<dyn LanguageModel>,
        cfg: &ContextorConfig,
    ) -> Self {
        Self {
            ingestor,
            rewriter,
            answerer,
            top_k: cfg.top_k,
            max_ctx_chars: cfg.max_ctx_chars,
            call_timeout: cfg.call_timeout,
        }
    }

    /// Answers `question` from the document's namespace.
    ///
    /// `history` must be chronological and must not contain `question`.
    /// The namespace is populated first if needed.
    ///
    /// # Errors
    /// Ingestion errors keep their own kind; model and retrieval failures
    /// become [`ContextorError::Generation`], deadlines [`ContextorError::Timeout`].
    #[instrument(level = "info", skip(self, question, history), fields(history = history.len()))]
    pub async fn answer(
        &self,
        user_id: &str,
        document_id: &str,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<QaAnswer, ContextorError> {
        let handle = self.ingestor.ensure_embedded(user_id, document_id).await?;
        debug!(namespace = handle.namespace(), outcome = ?handle.outcome(), "namespace ready");

        let query = self.rewrite(question, history).await?;

        let context = handle
            .retrieve(&query, self.top_k)
            .await
            .map_err(ContextorError::from_retrieval)?;
        info!(document_id, hits = context.len(), "context retrieved");

        let ctx = prompt::build_context(&context, self.max_ctx_chars);
        let messages = prompt::answer_messages(&ctx, history, question);
        let answer = self
            .complete(self.answerer.as_ref(), &messages, "answer")
            .await?;
        info!(document_id, chars = answer.len(), model = self.answerer.label(), "answer generated");

        Ok(QaAnswer {
            answer,
            query,
            context,
        })
    }

    /// Standalone search query; the raw question when there is no history.
    async fn rewrite(&self, question: &str, history: &[ChatTurn]) -> Result<String, ContextorError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }
        let messages = prompt::rewrite_messages(history, question);
        let rewritten = self
            .complete(self.rewriter.as_ref(), &messages, "query rewrite")
            .await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            debug!("empty rewrite, using the raw question");
            return Ok(question.to_string());
        }
        debug!(query = rewritten, "query rewritten");
        Ok(rewritten.to_string())
    }

    async fn complete(
        &self,
        model: &dyn LanguageModel,
        messages: &[ChatMessage],
        op: &'static str,
    ) -> Result<String, ContextorError> {
        bounded(op, self.call_timeout, async {
            model
                .complete(messages)
                .await
                .map_err(|e| ContextorError::from_model(op, e))
        })
        .await
    }
}

/// Runs `fut` with a deadline, mapping expiry to [`ContextorError::Timeout`].
pub(crate) async fn bounded<T, E, F>(
    op: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, ContextorError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ContextorError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(Into::into),
        Err(_) => Err(ContextorError::Timeout {
            op,
            secs: limit.as_secs(),
        }),
    }
}
