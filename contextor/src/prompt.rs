//! Prompt builders for the rewrite and answer steps.

use ai_llm_service::ChatMessage;
use doc_store::{ChatTurn, Role};
use rag_store::ChunkHit;

/// Appended after the conversation to ask for a standalone search query.
pub const REWRITE_INSTRUCTION: &str = "Given the above conversation, generate a search query to look up in order to get information relevant to the conversation";

/// System prompt of the answer step; `{context}` is replaced by the retrieved text.
pub const ANSWER_SYSTEM: &str = "Answer the user's question based on the below context:\n\n{context}";

fn turn_message(turn: &ChatTurn) -> ChatMessage {
    match turn.role {
        Role::Human => ChatMessage::user(turn.message.clone()),
        Role::Assistant => ChatMessage::assistant(turn.message.clone()),
    }
}

/// History (chronological), the question, then [`REWRITE_INSTRUCTION`].
pub fn rewrite_messages(history: &[ChatTurn], question: &str) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = history.iter().map(turn_message).collect();
    out.push(ChatMessage::user(question));
    out.push(ChatMessage::user(REWRITE_INSTRUCTION));
    out
}

/// System prompt with `context`, history (chronological), then the question.
pub fn answer_messages(context: &str, history: &[ChatTurn], question: &str) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(history.len() + 2);
    out.push(ChatMessage::system(ANSWER_SYSTEM.replace("{context}", context)));
    out.extend(history.iter().map(turn_message));
    out.push(ChatMessage::user(question));
    out
}

/// Joins hit texts in rank order with blank lines, clipped to `max_chars`
/// characters.
pub fn build_context(hits: &[ChunkHit], max_chars: usize) -> String {
    let joined = hits
        .iter()
        .map(|h| h.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    safe_truncate(&joined, max_chars).to_string()
}

fn safe_truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::ChatRole;

    fn hit(text: &str) -> ChunkHit {
        ChunkHit {
            score: 1.0,
            text: text.into(),
            page: 1,
            chunk_index: 0,
        }
    }

    #[test]
    fn context_keeps_rank_order() {
        let ctx = build_context(&[hit("first"), hit(" "), hit("second")], 100);
        assert_eq!(ctx, "first\n\nsecond");
    }

    #[test]
    fn context_is_clipped_on_char_boundary() {
        let ctx = build_context(&[hit("ééééé")], 3);
        assert_eq!(ctx, "ééé");
    }

    #[test]
    fn answer_prompt_layout() {
        let history = vec![ChatTurn::human("q1"), ChatTurn::assistant("a1")];
        let msgs = answer_messages("CTX", &history, "q2");
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, ChatRole::System);
        assert!(msgs[0].content.ends_with("context:\n\nCTX"));
        assert_eq!(msgs[1], ChatMessage::user("q1"));
        assert_eq!(msgs[2], ChatMessage::assistant("a1"));
        assert_eq!(msgs[3], ChatMessage::user("q2"));
    }

    #[test]
    fn rewrite_prompt_ends_with_instruction() {
        let msgs = rewrite_messages(&[ChatTurn::human("q1")], "and the second?");
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].content, "and the second?");
        assert_eq!(msgs[2].content, REWRITE_INSTRUCTION);
    }
}
