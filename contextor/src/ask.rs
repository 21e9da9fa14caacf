//! Ask-question orchestrator.
//!
//! quota check -> append human turn -> answer pipeline -> append assistant turn.
//!
//! Within one process the quota check, the history snapshot and the human
//! turn append run under a per-document lock, so concurrent asks cannot
//! overshoot the limit. The lock is released before the answer pipeline
//! runs. A failed answer leaves the human turn in place and no assistant
//! turn is written.

use std::sync::Arc;

use ai_llm_service::LanguageModel;
use doc_store::{ChatHistory, ChatTurn, DocumentStore};
use rag_store::Ingestor;
use services::locks::KeyedLocks;
use tracing::{info, instrument, warn};

use crate::{
    api_types::AskOutcome,
    cfg::ContextorConfig,
    error::ContextorError,
    pipeline::{AnswerPipeline, bounded},
    quota::{Decision, QuotaPolicy},
};

pub struct AskService {
    store: Arc<dyn DocumentStore>,
    history: ChatHistory,
    quota: QuotaPolicy,
    pipeline: AnswerPipeline,
    locks: KeyedLocks,
    cfg: ContextorConfig,
}

impl AskService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ingestor: Arc<Ingestor>,
        rewriter: Arc<dyn LanguageModel>,
        answerer: Arc<dyn LanguageModel>,
        cfg: ContextorConfig,
    ) -> Self {
        Self {
            history: ChatHistory::new(Arc::clone(&store)).with_limit(cfg.history_limit),
            quota: QuotaPolicy::new(cfg.free_question_limit, cfg.pro_question_limit),
            pipeline: AnswerPipeline::new(ingestor, rewriter, answerer, &cfg),
            locks: KeyedLocks::new(),
            store,
            cfg,
        }
    }

    /// Chronological chat log of a document owned by `user_id`.
    pub async fn chat_log(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatTurn>, ContextorError> {
        bounded(
            "chat log",
            self.cfg.call_timeout,
            self.history.all(user_id, document_id),
        )
        .await
    }

    /// Asks `question` about `document_id` on behalf of `user_id`.
    ///
    /// Quota denial is `Ok(AskOutcome::QuotaExceeded)` and writes nothing.
    ///
    /// # Errors
    /// Any infrastructure failure; see [`ContextorError::code`].
    #[instrument(level = "info", skip(self, question))]
    pub async fn ask(
        &self,
        user_id: &str,
        document_id: &str,
        question: &str,
    ) -> Result<AskOutcome, ContextorError> {
        let t = self.cfg.call_timeout;

        let history = {
            let _guard = self.locks.lock(document_id).await;

            bounded("document lookup", t, self.store.get_document(user_id, document_id)).await?;

            let turns = bounded("chat log", t, self.history.all(user_id, document_id)).await?;
            let prior_human = turns.iter().filter(|turn| turn.is_human()).count();
            let plan = bounded("user plan", t, self.store.user_plan(user_id)).await?;

            if let Decision::Deny { message } =
                self.quota.allow(plan.has_active_membership, prior_human)
            {
                info!(prior_human, pro = plan.has_active_membership, "quota exceeded");
                return Ok(AskOutcome::QuotaExceeded { message });
            }

            // Snapshot before the append: the question travels separately.
            let recent = bounded(
                "recent history",
                t,
                self.history.recent_window(user_id, document_id),
            )
            .await?;

            bounded(
                "append human turn",
                t,
                self.history
                    .append(user_id, document_id, ChatTurn::human(question)),
            )
            .await?;
            info!(prior_human, history = recent.len(), "question recorded");

            ChatHistory::chronological(recent)
        };

        let qa = match self
            .pipeline
            .answer(user_id, document_id, question, &history)
            .await
        {
            Ok(qa) => qa,
            Err(e) => {
                warn!(code = e.code(), error = %e, "answer failed, question kept in history");
                return Err(e);
            }
        };

        bounded(
            "append assistant turn",
            t,
            self.history
                .append(user_id, document_id, ChatTurn::assistant(qa.answer.clone())),
        )
        .await?;

        Ok(AskOutcome::Answered(qa))
    }
}
