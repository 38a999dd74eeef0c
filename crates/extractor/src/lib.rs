//! Step extraction from a remote instruction service
//!
//! Turns a free-text query into a validated [`StepList`] with one
//! chat-completions call. The call is a single attempt: timeout,
//! transport error, non-success status and malformed payload are all
//! terminal for that call, and no partial list is ever returned.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{ChatRequest, ChatResponse, HttpInstructionBackend, InstructionBackend};
pub use parse::extract_step_list;
pub use prompt::{build_messages, Message, Role};

use std::sync::Arc;
use thiserror::Error;

use carelink_config::ExtractorConfig;
use carelink_core::{LanguageMode, StepList};

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transport failure or timeout
    #[error("Request to instruction service failed: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("Instruction service returned status {code}")]
    Status { code: u16 },

    /// Response carried no parseable list of steps
    #[error("Could not find a step list in the response")]
    MalformedResponse,

    /// The parsed list contained no usable steps
    #[error("Instruction service returned an empty step list")]
    Empty,
}

/// Result type for extraction
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Extracts an ordered step list for a query
pub struct StepExtractor {
    backend: Arc<dyn InstructionBackend>,
    max_steps: usize,
}

impl std::fmt::Debug for StepExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepExtractor")
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl StepExtractor {
    /// Build an extractor over the HTTP backend described by `config`
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            backend: Arc::new(HttpInstructionBackend::new(config)),
            max_steps: config.max_steps,
        }
    }

    /// Build an extractor over any backend (mock backends in tests)
    pub fn new(backend: Arc<dyn InstructionBackend>, max_steps: usize) -> Self {
        Self { backend, max_steps }
    }

    /// One query, one call, one validated step list or a terminal error
    pub async fn extract(&self, query: &str, language: LanguageMode) -> Result<StepList> {
        let messages = build_messages(query, language, self.max_steps);

        let content = self.backend.complete(&messages).await?;
        tracing::debug!(len = content.len(), "Received instruction payload");

        let raw = extract_step_list(&content)?;
        StepList::new(raw).map_err(|_| ExtractError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedBackend(String);

    #[async_trait]
    impl InstructionBackend for FixedBackend {
        async fn complete(&self, _messages: &[Message]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn extractor(payload: &str) -> StepExtractor {
        StepExtractor::new(Arc::new(FixedBackend(payload.to_string())), 8)
    }

    #[tokio::test]
    async fn test_extract_prose_wrapped_list() {
        let ex = extractor(
            r#"Sure! Here are the steps: ["Open WhatsApp.", "Tap Chat."] Hope that helps!"#,
        );
        let list = ex
            .extract("how to message someone", LanguageMode::English)
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().text(), "Open WhatsApp.");
        assert_eq!(list.get(1).unwrap().text(), "Tap Chat.");
    }

    #[tokio::test]
    async fn test_extract_no_list_is_error() {
        let ex = extractor("I cannot help with that.");
        let err = ex
            .extract("how to message someone", LanguageMode::English)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_extract_blank_steps_is_empty() {
        let ex = extractor(r#"["", "  "]"#);
        let err = ex
            .extract("how to message someone", LanguageMode::English)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Empty));
    }
}
