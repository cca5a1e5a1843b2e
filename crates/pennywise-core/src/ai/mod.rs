//! Pluggable AI gateway abstraction
//!
//! The dashboard delegates two features to a hosted model: turning free
//! text into a transaction, and writing a weekly spending summary. This
//! module provides a backend-agnostic interface for both.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! Neither operation retries or imposes its own timeout. Failures are
//! returned to the caller, which decides what the user sees.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::from_env()?;
//! let ai = AIClient::from_config(&config);
//!
//! let parsed = ai.parse_transaction("groceries for 56.50 at Trader Joe's").await?;
//! println!("{} {}", parsed.category, parsed.amount);
//! ```

mod gemini;
mod mock;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use gemini::{transaction_schema, GeminiBackend, DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL};
pub use mock::MockBackend;
pub use openai_compatible::{
    transaction_response_format, OpenAICompatibleBackend, DEFAULT_OPENAI_HOST,
    DEFAULT_OPENAI_MODEL,
};
pub use types::*;

use async_trait::async_trait;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::models::Transaction;
use crate::prompts::PromptLibrary;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Extract description, amount and category from free text
    ///
    /// Fails with `Error::Validation` when the structured result is missing
    /// a field or carries a falsy value.
    async fn parse_transaction(&self, input: &str) -> Result<ParsedTransaction>;

    /// Summarize a window of transactions as markdown prose
    ///
    /// An empty slice returns `NO_TRANSACTIONS_MESSAGE` without any network call.
    async fn weekly_summary(&self, transactions: &[Transaction]) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini `generateContent` API
    Gemini(GeminiBackend),
    /// OpenAI chat completions API (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build the configured backend
    pub fn from_config(config: &Config) -> Self {
        let prompts = match config.prompts_dir {
            Some(ref dir) => PromptLibrary::with_override_dir(dir.clone()),
            None => PromptLibrary::embedded_only(),
        };
        let api_key = config.api_key.as_deref().unwrap_or_default();

        tracing::info!(
            backend = config.backend.as_str(),
            model = %config.model,
            host = %config.host,
            "Configured AI backend"
        );

        match config.backend {
            BackendKind::Gemini => AIClient::Gemini(GeminiBackend::with_prompts(
                &config.host,
                &config.model,
                api_key,
                prompts,
            )),
            BackendKind::OpenAICompatible => {
                let backend = match config.api_key {
                    Some(ref key) => {
                        OpenAICompatibleBackend::with_api_key(&config.host, &config.model, key)
                    }
                    None => OpenAICompatibleBackend::new(&config.host, &config.model),
                };
                AIClient::OpenAICompatible(backend.with_prompts(prompts))
            }
            BackendKind::Mock => AIClient::Mock(MockBackend::new()),
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: &str) -> Self {
        AIClient::Gemini(GeminiBackend::with_prompts(
            host,
            model,
            api_key,
            PromptLibrary::embedded_only(),
        ))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn parse_transaction(&self, input: &str) -> Result<ParsedTransaction> {
        match self {
            AIClient::Gemini(b) => b.parse_transaction(input).await,
            AIClient::OpenAICompatible(b) => b.parse_transaction(input).await,
            AIClient::Mock(b) => b.parse_transaction(input).await,
        }
    }

    async fn weekly_summary(&self, transactions: &[Transaction]) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.weekly_summary(transactions).await,
            AIClient::OpenAICompatible(b) => b.weekly_summary(transactions).await,
            AIClient::Mock(b) => b.weekly_summary(transactions).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
