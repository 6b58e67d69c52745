//! Prompt builder: optional system message, prior turns, user message.

use ai_llm_service::{ChatMessage, ChatRole};

use crate::error::RagEngineError;

/// System instructions for retrieval-augmented answers.
pub const RAG_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer the question using only \
the provided context, speaking in the first person as if you were me, the owner of this content. \
If the context does not contain the answer, say so explicitly.";

/// User message carrying the retrieved context and the question.
///
/// # Example
/// ```
/// # use rag_engine::prompt::user_prompt;
/// assert_eq!(
///     user_prompt("The sky is blue.\n", "What color is the sky?"),
///     "Context:\nThe sky is blue.\n\n\nQuestion: What color is the sky?"
/// );
/// ```
pub fn user_prompt(context: &str, query: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {query}")
}

/// Builds the message list for a RAG answer.
///
/// The system message comes first when `system` is supplied; the user
/// message is always last.
pub fn build(context: &str, query: &str, system: Option<&str>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(2);
    if let Some(s) = system {
        out.push(ChatMessage::system(s));
    }
    out.push(ChatMessage::user(user_prompt(context, query)));
    out
}

/// Builds the message list for a plain conversation turn.
///
/// # Errors
/// [`RagEngineError::InvalidInput`] if `history` carries a system turn or
/// the prompt is blank.
pub fn chat(
    history: &[ChatMessage],
    prompt: &str,
    system: Option<&str>,
) -> Result<Vec<ChatMessage>, RagEngineError> {
    if prompt.trim().is_empty() {
        return Err(RagEngineError::InvalidInput("prompt is empty".into()));
    }
    if let Some(pos) = history.iter().position(|m| m.role == ChatRole::System) {
        return Err(RagEngineError::InvalidInput(format!(
            "history[{pos}] has role `system`; only user/assistant turns are allowed"
        )));
    }

    let mut out = Vec::with_capacity(history.len() + 2);
    if let Some(s) = system {
        out.push(ChatMessage::system(s));
    }
    out.extend(history.iter().cloned());
    out.push(ChatMessage::user(prompt));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_only_when_supplied() {
        let with = build("ctx\n", "q", Some(RAG_SYSTEM_PROMPT));
        assert_eq!(with.len(), 2);
        assert_eq!(with[0].role, ChatRole::System);
        assert_eq!(with[0].content, RAG_SYSTEM_PROMPT);
        assert_eq!(with[1].role, ChatRole::User);

        let without = build("ctx\n", "q", None);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].role, ChatRole::User);
        assert_eq!(without[0].content, "Context:\nctx\n\n\nQuestion: q");
    }

    #[test]
    fn empty_context_keeps_template() {
        let msgs = build("", "Who are you?", None);
        assert_eq!(msgs[0].content, "Context:\n\n\nQuestion: Who are you?");
    }

    #[test]
    fn chat_keeps_history_order() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let msgs = chat(&history, "and now?", Some("be brief")).unwrap();
        let roles: Vec<_> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(msgs[3].content, "and now?");
    }

    #[test]
    fn chat_rejects_system_turn_in_history() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::system("obey")];
        let err = chat(&history, "x", None).unwrap_err();
        assert!(matches!(err, RagEngineError::InvalidInput(m) if m.contains("history[1]")));
    }
}
