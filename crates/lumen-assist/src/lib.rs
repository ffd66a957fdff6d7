//! lumen-assist: a hybrid question-answering engine for an LED-converter
//! product catalog.
//!
//! Questions flow through three stages:
//! 1. A structured resolver, an ordered chain of intent handlers over the
//!    canonical catalog projection. First matching handler wins.
//! 2. Semantic retrieval over serialized catalog records when no handler
//!    answers.
//! 3. A generative model constrained to the retrieved context.
//!
//! The catalog is projected once at startup into a fixed schema
//! ([`CanonicalProduct`]); all matching, filtering and ranking run against
//! that projection, never against raw records.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod llm;
pub mod normalize;
pub mod resolver;
pub mod retrieval;
pub mod types;

pub use catalog::Catalog;
pub use chat::{AssistEngine, ConversationTurn, Role, Session};
pub use config::{AssistConfig, LlmConfig, RetrievalConfig};
pub use llm::{ChatModel, GenerationConfig, LlmError, OpenAiCompatChat};
pub use resolver::{resolve, Resolution, UNRESOLVED_ANSWER};
pub use retrieval::{EmbeddingModel, HashedBowEmbedder, SemanticIndex};
pub use types::{CanonicalProduct, LampRange, RetrievedDocument, NOT_AVAILABLE};

pub use anyhow::{Error, Result};
