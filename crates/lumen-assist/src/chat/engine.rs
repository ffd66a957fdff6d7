//! The per-turn pipeline: structured resolution first, semantic retrieval
//! plus generation only when the whole handler chain declines.

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::AssistConfig;
use crate::llm::{ChatModel, GenerationConfig};
use crate::resolver::{self, Resolution};
use crate::retrieval::{format_context, EmbeddingModel, SemanticIndex};

use super::{Session, FALLBACK_SYSTEM_PROMPT};

/// The assembled engine. Catalog and index are read-only after
/// construction; sessions are owned by the caller so one engine serves
/// any number of independent conversations.
pub struct AssistEngine<E: EmbeddingModel> {
    catalog: Catalog,
    index: SemanticIndex<E>,
    llm: Box<dyn ChatModel>,
    config: AssistConfig,
}

impl<E: EmbeddingModel> AssistEngine<E> {
    pub fn new(
        catalog: Catalog,
        index: SemanticIndex<E>,
        llm: Box<dyn ChatModel>,
        config: AssistConfig,
    ) -> Self {
        info!(
            products = catalog.len(),
            top_k = config.retrieval.top_k,
            "assist engine ready"
        );
        Self {
            catalog,
            index,
            llm,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Answer one question within a session. Always returns an answer
    /// string and always appends exactly one user turn and one assistant
    /// turn, service failures included.
    pub async fn ask(&self, session: &mut Session, question: &str) -> String {
        let answer = match resolver::resolve(question, &self.catalog) {
            Resolution::Answer(text) => text,
            Resolution::Unresolved => {
                debug!("structured resolver declined; running fallback");
                self.fallback(question).await
            }
        };
        session.push_user(question);
        session.push_assistant(answer.clone());
        answer
    }

    async fn fallback(&self, question: &str) -> String {
        let context = match self.index.top_k(question, self.config.retrieval.top_k) {
            Ok(documents) => format_context(&documents),
            Err(error) => {
                warn!(%error, "semantic retrieval failed");
                return format!("Error: {error}");
            }
        };
        let user_prompt = format!("Context:\n{context}\n\nQuestion: {question}");
        let generation = GenerationConfig {
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        };
        match self
            .llm
            .chat(FALLBACK_SYSTEM_PROMPT, &user_prompt, generation)
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "generative fallback failed");
                format!("Error: {error}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::retrieval::HashedBowEmbedder;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockChat {
        calls: Mutex<Vec<String>>,
        reply: Result<String, ()>,
    }

    impl MockChat {
        fn answering(reply: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(reply.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for &MockChat {
        async fn chat(
            &self,
            _system: &str,
            user: &str,
            _config: GenerationConfig,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(user.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::Malformed),
            }
        }
    }

    fn catalog() -> Catalog {
        let raw = json!({
            "C1": {
                "ARTNR": 123456,
                "CONVERTER DESCRIPTION:": "LED CONVERTER 24V DC 100W IP20",
                "Listprice": "45,50",
                "IP": 67
            }
        });
        Catalog::from_raw(raw.as_object().unwrap())
    }

    fn engine(chat: &'static MockChat) -> AssistEngine<HashedBowEmbedder> {
        let catalog = catalog();
        let index = SemanticIndex::build(&catalog, HashedBowEmbedder::new(64)).unwrap();
        AssistEngine::new(catalog, index, Box::new(chat), AssistConfig::default())
    }

    fn leaked(chat: MockChat) -> &'static MockChat {
        Box::leak(Box::new(chat))
    }

    #[tokio::test]
    async fn resolved_question_never_calls_the_llm() {
        let chat = leaked(MockChat::answering("should not be used"));
        let engine = engine(chat);
        let mut session = Session::new();
        let answer = engine.ask(&mut session, "what is the price of 123456").await;
        assert!(answer.contains("45.50"));
        assert!(chat.calls.lock().unwrap().is_empty());
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn unresolved_question_runs_retrieval_and_generation_once() {
        let chat = leaked(MockChat::answering("generated answer"));
        let engine = engine(chat);
        let mut session = Session::new();
        let answer = engine.ask(&mut session, "is this suitable for bathrooms?").await;
        assert_eq!(answer, "generated answer");

        let calls = chat.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        // The prompt carries retrieved catalog context plus the question.
        assert!(calls[0].contains("Converter C1:"));
        assert!(calls[0].contains("Question: is this suitable for bathrooms?"));
    }

    #[tokio::test]
    async fn every_turn_appends_one_user_and_one_assistant_entry() {
        let chat = leaked(MockChat::answering("generated answer"));
        let engine = engine(chat);
        let mut session = Session::new();
        engine.ask(&mut session, "what is the price of 123456").await;
        engine.ask(&mut session, "is this suitable for bathrooms?").await;
        assert_eq!(session.len(), 4);
        let roles: Vec<_> = session.history().iter().map(|t| t.role).collect();
        use crate::chat::Role::*;
        assert_eq!(roles, vec![User, Assistant, User, Assistant]);
    }

    #[tokio::test]
    async fn service_failure_still_completes_the_turn() {
        let chat = leaked(MockChat::failing());
        let engine = engine(chat);
        let mut session = Session::new();
        let answer = engine.ask(&mut session, "is this suitable for bathrooms?").await;
        assert!(answer.starts_with("Error:"));
        assert_eq!(session.len(), 2);
        assert_eq!(session.history()[1].content, answer);
    }
}
