//! Chat-completions wire types and HTTP backend

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use carelink_config::ExtractorConfig;

use crate::prompt::Message;
use crate::{ExtractError, Result};

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

/// Response body from the chat-completions endpoint
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Seam to the remote instruction service
///
/// Tests swap in fixed or failing backends; production uses
/// [`HttpInstructionBackend`].
#[async_trait]
pub trait InstructionBackend: Send + Sync {
    /// One request, one textual response. No retries.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// reqwest-backed instruction service client
pub struct HttpInstructionBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl HttpInstructionBackend {
    pub fn new(config: &ExtractorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl InstructionBackend for HttpInstructionBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(code = status.as_u16(), "Instruction service error status");
            return Err(ExtractError::Status {
                code: status.as_u16(),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Http(e.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ExtractError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserializes() {
        let json = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "[\"Open WhatsApp.\"]" } }
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "[\"Open WhatsApp.\"]");
    }

    #[test]
    fn test_request_serializes_temperature() {
        let request = ChatRequest {
            model: "llama-3.3-70b-versatile".to_string(),
            messages: vec![Message::user("q")],
            temperature: 0.2,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"temperature\":0.2"));
    }
}
