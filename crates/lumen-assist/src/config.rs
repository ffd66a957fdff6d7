//! Engine configuration with validated JSON loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Records handed to the generative model per fallback query.
    pub top_k: usize,
    /// Embedding vector width.
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions URL.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            dimension: 384,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3".to_string(),
            temperature: 0.3,
            max_tokens: 128,
            connect_timeout_secs: 15,
            request_timeout_secs: 120,
        }
    }
}

impl AssistConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.retrieval.top_k > 0, "retrieval.top_k must be positive");
        anyhow::ensure!(
            self.retrieval.dimension > 0,
            "retrieval.dimension must be positive"
        );
        anyhow::ensure!(!self.llm.endpoint.is_empty(), "llm.endpoint must be set");
        anyhow::ensure!(!self.llm.model.is_empty(), "llm.model must be set");
        anyhow::ensure!(
            (0.0..=2.0).contains(&self.llm.temperature),
            "llm.temperature must be between 0.0 and 2.0"
        );
        anyhow::ensure!(self.llm.max_tokens > 0, "llm.max_tokens must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AssistConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.llm.max_tokens, 128);
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AssistConfig =
            serde_json::from_str(r#"{"llm": {"model": "mistral"}}"#).unwrap();
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.endpoint, LlmConfig::default().endpoint);
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AssistConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AssistConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }
}
