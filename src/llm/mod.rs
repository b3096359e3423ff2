//! Hosted chat-completion client used to phrase answers over retrieved notes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{CocoonError, Result};

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one system + user exchange and return the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier reported alongside answers.
    fn model(&self) -> &str;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !config.api_key.is_empty(),
            "llm.api_key must be set (or COCOON_LLM_API_KEY)"
        );
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CocoonError::Llm(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CocoonError::Llm(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CocoonError::Llm(format!("unreadable completion: {e}")))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CocoonError::Llm("completion had no content".into()))?;

        tracing::debug!(model = %self.model, chars = answer.len(), "completion received");
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build the chat model if one is enabled. A missing key disables it with a warning.
pub fn create_chat_model(config: &LlmConfig) -> Option<Arc<dyn ChatModel>> {
    if !config.enabled {
        return None;
    }
    match OpenAiChatModel::new(config) {
        Ok(model) => {
            tracing::info!(model = %config.model, base_url = %config.base_url, "chat model enabled");
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::warn!(error = %e, "chat model disabled; answering in retrieval-only mode");
            None
        }
    }
}
