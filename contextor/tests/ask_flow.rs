use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use ai_llm_service::{
    AiLlmError, ChatMessage, ChatRole, LanguageModel,
    error_handler::{Provider, ProviderError, ProviderErrorKind},
};
use async_trait::async_trait;
use contextor::{
    AskOutcome, AskResult, AskService, ContextorConfig, GENERIC_FAILURE_MESSAGE,
    prompt::REWRITE_INSTRUCTION,
};
use doc_store::{ChatTurn, DocumentStore, MemoryDocumentStore, Role};
use rag_store::{
    HashingEmbedder, IngestOptions, Ingestor, MemoryFetcher, MemoryIndex, RecursiveSplitter,
};

const URL: &str = "mem://uploads/manual.pdf";
const USER: &str = "user-1";

fn manual() -> String {
    let mut text = String::from("Solar Kettle X2 owner's manual.\n\n");
    for i in 1..=10 {
        text.push_str(&format!(
            "Chapter {i}. The kettle heats water using rooftop panels. \
             Step {i} explains how to clean the filter.\n\n"
        ));
    }
    text
}

/// Replays scripted replies and records every prompt it receives.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    fn replying(replies: &[&str]) -> Arc<Self> {
        let m = Self::default();
        m.replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| Ok(r.to_string())));
        Arc::new(m)
    }

    fn failing() -> Arc<Self> {
        let m = Self::default();
        m.replies
            .lock()
            .unwrap()
            .push_back(Err("model overloaded".into()));
        Arc::new(m)
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(AiLlmError::Provider(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(reason),
            ))),
            None => Ok("default reply".into()),
        }
    }
}

struct World {
    store: Arc<MemoryDocumentStore>,
    fetcher: Arc<MemoryFetcher>,
    index: Arc<MemoryIndex>,
    rewriter: Arc<ScriptedModel>,
    answerer: Arc<ScriptedModel>,
    service: AskService,
}

fn world(fetcher: MemoryFetcher, rewriter: Arc<ScriptedModel>, answerer: Arc<ScriptedModel>) -> World {
    let store = Arc::new(MemoryDocumentStore::new());
    let fetcher = Arc::new(fetcher);
    let index = Arc::new(MemoryIndex::new());
    let cfg = ContextorConfig::default();
    let ingestor = Arc::new(Ingestor::new(
        store.clone(),
        fetcher.clone(),
        index.clone(),
        Arc::new(HashingEmbedder::default()),
        RecursiveSplitter::new(300, 50).unwrap(),
        IngestOptions {
            embedding_dim: None,
            embedding_concurrency: 2,
            call_timeout: Duration::from_secs(5),
            ingest_timeout: Duration::from_secs(30),
        },
    ));
    let service = AskService::new(
        store.clone(),
        ingestor,
        rewriter.clone(),
        answerer.clone(),
        cfg,
    );
    World {
        store,
        fetcher,
        index,
        rewriter,
        answerer,
        service,
    }
}

async fn seed_turns(store: &MemoryDocumentStore, doc: &str, questions: usize) {
    for i in 0..questions {
        store
            .append_chat_turn(USER, doc, ChatTurn::human(format!("q{i}")))
            .await
            .unwrap();
        store
            .append_chat_turn(USER, doc, ChatTurn::assistant(format!("a{i}")))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn first_question_ingests_and_records_both_turns() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&["It is the manual of a solar kettle."]),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();

    let out = w
        .service
        .ask(USER, &doc.id, "What is this document about?")
        .await
        .unwrap();
    let AskOutcome::Answered(qa) = out else {
        panic!("expected an answer");
    };
    assert_eq!(qa.answer, "It is the manual of a solar kettle.");
    assert_eq!(qa.query, "What is this document about?");
    assert!(!qa.context.is_empty() && qa.context.len() <= 4);

    assert_eq!(w.index.batches_written(), 1);
    assert!(w.rewriter.calls().is_empty(), "no history, no rewrite");

    let turns = w.service.chat_log(USER, &doc.id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::Human);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].message, qa.answer);

    let answer_prompt = &w.answerer.calls()[0];
    assert_eq!(answer_prompt[0].role, ChatRole::System);
    assert!(answer_prompt[0].content.contains("rooftop panels"));
    assert_eq!(answer_prompt.len(), 2);
}

#[tokio::test]
async fn second_question_reuses_namespace_and_rewrites_with_history() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&["how to clean the kettle filter"]),
        ScriptedModel::replying(&["A solar kettle manual.", "Rinse it weekly."]),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();

    w.service.ask(USER, &doc.id, "What is this about?").await.unwrap();
    let out = w.service.ask(USER, &doc.id, "How do I clean it?").await.unwrap();
    let AskOutcome::Answered(qa) = out else {
        panic!("expected an answer");
    };
    assert_eq!(qa.answer, "Rinse it weekly.");
    assert_eq!(qa.query, "how to clean the kettle filter");

    assert_eq!(w.index.batches_written(), 1);
    assert_eq!(w.fetcher.fetch_count(), 1);

    let rewrite = &w.rewriter.calls()[0];
    assert_eq!(
        rewrite
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>(),
        vec![
            "What is this about?",
            "A solar kettle manual.",
            "How do I clean it?",
            REWRITE_INSTRUCTION,
        ]
    );

    let answer = &w.answerer.calls()[1];
    assert_eq!(answer.len(), 4);
    assert_eq!(answer[1], ChatMessage::user("What is this about?"));
    assert_eq!(answer[2], ChatMessage::assistant("A solar kettle manual."));
    assert_eq!(answer[3], ChatMessage::user("How do I clean it?"));

    assert_eq!(w.service.chat_log(USER, &doc.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn free_tier_fifth_question_is_denied_without_writes() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&[]),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();
    seed_turns(&w.store, &doc.id, 4).await;

    let out = w.service.ask(USER, &doc.id, "One more?").await.unwrap();
    let AskOutcome::QuotaExceeded { message } = out else {
        panic!("expected quota denial");
    };
    assert_eq!(message, "You'll need to upgrade to PRO to ask more than 4 questions!");

    let turns = w.service.chat_log(USER, &doc.id).await.unwrap();
    assert_eq!(turns.iter().filter(|t| t.is_human()).count(), 4);
    assert_eq!(turns.len(), 8);
    assert_eq!(w.fetcher.fetch_count(), 0);
    assert!(w.answerer.calls().is_empty());
}

#[tokio::test]
async fn pro_tier_twenty_first_question_is_denied() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&[]),
    );
    w.store.set_membership(USER, true).await;
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();
    seed_turns(&w.store, &doc.id, 20).await;

    let out = w.service.ask(USER, &doc.id, "Question 21").await.unwrap();
    let AskOutcome::QuotaExceeded { message } = out else {
        panic!("expected quota denial");
    };
    assert_eq!(message, "You've reached the PRO limit of the 20 question per document!");
    assert_eq!(w.service.chat_log(USER, &doc.id).await.unwrap().len(), 40);
}

#[tokio::test]
async fn pro_tier_history_window_is_bounded_and_chronological() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&["rewritten"]),
        ScriptedModel::replying(&["fine"]),
    );
    w.store.set_membership(USER, true).await;
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();
    seed_turns(&w.store, &doc.id, 6).await;

    w.service.ask(USER, &doc.id, "latest").await.unwrap();

    let answer = &w.answerer.calls()[0];
    let history: Vec<&str> = answer[1..answer.len() - 1]
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        history,
        vec!["q1", "a1", "q2", "a2", "q3", "a3", "q4", "a4", "q5", "a5"]
    );
    assert_eq!(answer.last().unwrap().content, "latest");
}

#[tokio::test]
async fn fetch_failure_keeps_the_question() {
    let w = world(
        MemoryFetcher::new().with_status(URL, 500),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&[]),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();

    let err = w.service.ask(USER, &doc.id, "Anything?").await.unwrap_err();
    assert_eq!(err.code(), "FETCH_ERROR");

    let turns = w.service.chat_log(USER, &doc.id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].message, "Anything?");
    assert_eq!(w.index.batches_written(), 0);

    let rendered = AskResult::from(Err(err));
    assert!(!rendered.success);
    assert_eq!(rendered.message.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
    assert_eq!(rendered.code, Some("FETCH_ERROR"));
}

#[tokio::test]
async fn model_failure_is_a_generation_error() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::failing(),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();

    let err = w.service.ask(USER, &doc.id, "Anything?").await.unwrap_err();
    assert_eq!(err.code(), "GENERATION_ERROR");

    let turns = w.service.chat_log(USER, &doc.id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert!(turns[0].is_human());
    // Namespace survives a failed answer, so the retry skips ingestion.
    assert_eq!(w.index.batches_written(), 1);
}

#[tokio::test]
async fn foreign_document_is_not_found_and_untouched() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&[]),
    );
    let doc = w.store.register_document("someone-else", "manual.pdf", URL).await.unwrap();

    let err = w.service.ask(USER, &doc.id, "Hello?").await.unwrap_err();
    assert_eq!(err.code(), "DOCUMENT_NOT_FOUND");
    assert!(
        w.store
            .chat_turns("someone-else", &doc.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn concurrent_asks_cannot_overshoot_the_free_quota() {
    let w = world(
        MemoryFetcher::new().with_object(URL, manual()),
        ScriptedModel::replying(&[]),
        ScriptedModel::replying(&[]),
    );
    let doc = w.store.register_document(USER, "manual.pdf", URL).await.unwrap();
    seed_turns(&w.store, &doc.id, 3).await;

    let service = Arc::new(w.service);
    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let service = service.clone();
            let id = doc.id.clone();
            tokio::spawn(async move { service.ask(USER, &id, &format!("race {i}")).await })
        })
        .collect();

    let mut answered = 0;
    for t in tasks {
        if let AskOutcome::Answered(_) = t.await.unwrap().unwrap() {
            answered += 1;
        }
    }
    assert_eq!(answered, 1);
    let turns = w.store.chat_turns(USER, &doc.id).await.unwrap();
    assert_eq!(turns.iter().filter(|t| t.is_human()).count(), 4);
}
