//! Google Gemini backend implementation
//!
//! Talks to the `generateContent` REST endpoint. Transaction parsing uses
//! Gemini's structured output (`responseMimeType` + `responseSchema`) so
//! the model is constrained to the `{description, amount, category}` shape;
//! the weekly summary is plain text generation.
//!
//! # Configuration
//!
//! - `API_KEY`: Gemini API key (required)
//! - `AI_MODEL`: Model name (default: gemini-2.5-flash)
//! - `AI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)

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

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl GeminiBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self::with_prompts(base_url, model, api_key, PromptLibrary::new())
    }

    /// Create with a specific prompt library (e.g. a custom override dir)
    pub fn with_prompts(
        base_url: &str,
        model: &str,
        api_key: &str,
        prompts: PromptLibrary,
    ) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            prompts: Arc::new(RwLock::new(prompts)),
        }
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

    /// Call `generateContent`, optionally constraining output to a schema
    async fn generate(&self, prompt: &RenderedPrompt, schema: Option<Value>) -> Result<String> {
        let generation_config = schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        });

        let request = GenerateContentRequest {
            system_instruction: (!prompt.system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: prompt.system.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.user.clone(),
                }],
            }],
            generation_config,
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, "Sending Gemini generateContent request");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        body.text()
            .ok_or_else(|| Error::Transport("No candidates in Gemini response".into()))
    }
}

/// Response schema for transaction extraction, in Gemini's OpenAPI subset
pub fn transaction_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {
                "type": "STRING",
                "description": "A short summary of the transaction."
            },
            "amount": {
                "type": "NUMBER",
                "description": "The transaction amount as a positive number."
            },
            "category": {
                "type": "STRING",
                "description": "The transaction category."
            }
        },
        "required": ["description", "amount", "category"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        Some(content.parts.into_iter().map(|p| p.text).collect())
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn parse_transaction(&self, input: &str) -> Result<ParsedTransaction> {
        let mut vars = HashMap::new();
        vars.insert("input", input);
        let prompt = self.render(PromptId::ParseTransaction, &vars)?;

        let response = self.generate(&prompt, Some(transaction_schema())).await?;
        debug!("Gemini parse response: {}", response);

        parse_transaction_response(&response)
    }

    async fn weekly_summary(&self, transactions: &[Transaction]) -> Result<String> {
        let Some(payload) = summary_payload(transactions)? else {
            return Ok(NO_TRANSACTIONS_MESSAGE.to_string());
        };

        let mut vars = HashMap::new();
        vars.insert("transactions", payload.as_str());
        let prompt = self.render(PromptId::WeeklySummary, &vars)?;

        let response = self.generate(&prompt, None).await?;
        debug!(chars = response.len(), "Gemini summary response");

        parse_summary_response(&response)
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/v1beta/models/{}", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .is_ok_and(|resp| resp.status().is_success())
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
    fn test_backend_new_trims_trailing_slash() {
        let backend = GeminiBackend::new("https://example.test/", DEFAULT_GEMINI_MODEL, "k");
        assert_eq!(backend.host(), "https://example.test");
        assert_eq!(backend.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_with_model() {
        let backend = GeminiBackend::new(DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL, "k");
        let other = backend.with_model("gemini-2.5-pro");
        assert_eq!(other.model(), "gemini-2.5-pro");
        assert_eq!(other.host(), backend.host());
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "Be helpful".into(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: "User text: \"coffee 4\"".into(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: transaction_schema(),
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be helpful");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            json["generationConfig"]["responseSchema"]["required"],
            json!(["description", "amount", "category"])
        );
    }

    #[test]
    fn test_request_without_schema_omits_generation_config() {
        let request = GenerateContentRequest {
            system_instruction: None,
            contents: vec![],
            generation_config: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello "}, {"text": "there"}]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_empty_summary_skips_network() {
        // Unroutable port: any request would fail
        let backend = GeminiBackend::new("http://127.0.0.1:1", DEFAULT_GEMINI_MODEL, "k");
        let summary = backend.weekly_summary(&[]).await.unwrap();
        assert_eq!(summary, NO_TRANSACTIONS_MESSAGE);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = GeminiBackend::new("http://127.0.0.1:1", DEFAULT_GEMINI_MODEL, "k");
        assert!(!backend.health_check().await);
    }
}
