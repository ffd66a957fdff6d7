//! Conversation session state and the turn orchestrator.

pub mod engine;

use serde::{Deserialize, Serialize};

pub use engine::AssistEngine;

/// System prompt for the generative fallback. The model is constrained to
/// the retrieved context so it cannot invent catalog facts.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a product assistant for LED converters. \
Answer the question using ONLY the provided context. If the answer is not in the context, \
say \"I don't know\". Be concise and factual.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Append-only conversation history. Every answered question adds exactly
/// one user turn and one assistant turn; turns are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub(crate) fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(ConversationTurn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(ConversationTurn {
            role: Role::Assistant,
            content: content.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_is_append_only_in_pairs() {
        let mut session = Session::new();
        assert!(session.is_empty());
        session.push_user("q1");
        session.push_assistant("a1");
        session.push_user("q2");
        session.push_assistant("a2");
        assert_eq!(session.len(), 4);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(session.history()[3].role, Role::Assistant);
        assert_eq!(session.history()[2].content, "q2");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let turn = ConversationTurn {
            role: Role::Assistant,
            content: "hi".into(),
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
