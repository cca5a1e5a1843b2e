//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - OpenAI itself (https://api.openai.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! Transaction parsing requests a `json_schema` response format. Servers
//! that ignore it still work as long as the reply contains a JSON object.
//!
//! # Configuration
//!
//! - `AI_HOST`: Server URL (default: https://api.openai.com)
//! - `AI_MODEL`: Model name (default: gpt-4o-mini)
//! - `API_KEY`: Bearer token

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Transaction;
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

use super::parsing::{parse_summary_response, parse_transaction_response};
use super::types::{summary_payload, ParsedTransaction, NO_TRANSACTIONS_MESSAGE};
use super::AIBackend;

pub const DEFAULT_OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible backend
///
/// Works with any server implementing the OpenAI `/v1/chat/completions` API.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend (no authentication)
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    /// Replace the prompt library (e.g. a custom override dir)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        prompts.render(id, vars)
    }

    /// Make a chat completion request
    async fn chat_completion(
        &self,
        prompt: &RenderedPrompt,
        response_format: Option<Value>,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !prompt.system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: prompt.system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.user.clone(),
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.1),
            response_format,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Transport("No response from OpenAI API".into()))
    }
}

/// `response_format` constraining replies to the transaction shape
pub fn transaction_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "transaction",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "A short summary of the transaction."
                    },
                    "amount": {
                        "type": "number",
                        "description": "The transaction amount as a positive number."
                    },
                    "category": {
                        "type": "string",
                        "description": "The transaction category."
                    }
                },
                "required": ["description", "amount", "category"],
                "additionalProperties": false
            }
        }
    })
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn parse_transaction(&self, input: &str) -> Result<ParsedTransaction> {
        let mut vars = HashMap::new();
        vars.insert("input", input);
        let prompt = self.render(PromptId::ParseTransaction, &vars)?;

        let response = self
            .chat_completion(&prompt, Some(transaction_response_format()))
            .await?;
        debug!("OpenAI-compatible parse response: {}", response);

        parse_transaction_response(&response)
    }

    async fn weekly_summary(&self, transactions: &[Transaction]) -> Result<String> {
        let Some(payload) = summary_payload(transactions)? else {
            return Ok(NO_TRANSACTIONS_MESSAGE.to_string());
        };

        let mut vars = HashMap::new();
        vars.insert("transactions", payload.as_str());
        let prompt = self.render(PromptId::WeeklySummary, &vars)?;

        let response = self.chat_completion(&prompt, None).await?;
        debug!(chars = response.len(), "OpenAI-compatible summary response");

        parse_summary_response(&response)
    }

    async fn health_check(&self) -> bool {
        // Try /v1/models first (standard OpenAI endpoint)
        let mut models = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));
        if let Some(ref api_key) = self.api_key {
            models = models.header("Authorization", format!("Bearer {}", api_key));
        }
        if let Ok(resp) = models.send().await {
            if resp.status().is_success() {
                return true;
            }
        }

        // Try /health (common for LocalAI, llama-server)
        if let Ok(resp) = self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }

        false
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new() {
        let backend = OpenAICompatibleBackend::new("http://localhost:8000", "llama3.2");
        assert_eq!(backend.model(), "llama3.2");
        assert_eq!(backend.host(), "http://localhost:8000");
        assert!(backend.api_key.is_none());
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OpenAICompatibleBackend::new("http://localhost:8000/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:8000");
    }

    #[test]
    fn test_backend_with_api_key() {
        let backend =
            OpenAICompatibleBackend::with_api_key(DEFAULT_OPENAI_HOST, "gpt-4o", "sk-test123");
        assert_eq!(backend.model(), "gpt-4o");
        assert_eq!(backend.api_key, Some("sk-test123".to_string()));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "llama3.2");
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_empty_summary_skips_network() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "llama3.2");
        let summary = backend.weekly_summary(&[]).await.unwrap();
        assert_eq!(summary, NO_TRANSACTIONS_MESSAGE);
    }

    #[test]
    fn test_chat_completion_request_serialization() {
        let request = ChatCompletionRequest {
            model: "llama3.2".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a coach".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "Hello".to_string(),
                },
            ],
            temperature: Some(0.1),
            response_format: None,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.1).abs() < 0.001);
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_transaction_response_format() {
        let format = transaction_response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(
            format["json_schema"]["schema"]["properties"]["amount"]["type"],
            "number"
        );
    }

    #[test]
    fn test_chat_completion_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "{\"description\":\"Tea\",\"amount\":3,\"category\":\"Food\"}"
                },
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        let content = response.choices[0].message.content.as_deref().unwrap();
        let parsed = parse_transaction_response(content).unwrap();
        assert_eq!(parsed.description, "Tea");
    }
}
