//! Test utilities for pennywise-core
//!
//! This module provides a mock Gemini server that answers the
//! `generateContent` calls made by `GeminiBackend`, so gateway behaviour can
//! be exercised end to end without network access or an API key.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Transaction reply used until a test sets its own
pub const DEFAULT_TRANSACTION_REPLY: &str =
    r#"{"description":"Coffee Shop","amount":5.75,"category":"Food"}"#;

/// Summary reply used until a test sets its own
pub const DEFAULT_SUMMARY_REPLY: &str =
    "**Overview:** Most of your spending went to Food.\n\n**Tip:** Brew coffee at home.";

#[derive(Default)]
struct Scripted {
    transaction_reply: String,
    summary_reply: String,
    failure: Option<StatusCode>,
    last_request: Option<Value>,
    last_api_key: Option<String>,
}

#[derive(Clone)]
struct MockState {
    calls: Arc<AtomicUsize>,
    scripted: Arc<Mutex<Scripted>>,
}

/// Mock Gemini server for testing
///
/// Requests that carry a `responseSchema` get the transaction reply; all
/// others get the summary reply.
pub struct MockAiServer {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = MockState {
            calls: Arc::new(AtomicUsize::new(0)),
            scripted: Arc::new(Mutex::new(Scripted {
                transaction_reply: DEFAULT_TRANSACTION_REPLY.to_string(),
                summary_reply: DEFAULT_SUMMARY_REPLY.to_string(),
                ..Scripted::default()
            })),
        };

        let app = Router::new()
            .route(
                "/v1beta/models/:model",
                get(handle_model).post(handle_generate),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of `generateContent` calls received
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Text returned for schema-constrained (transaction) requests
    pub fn set_transaction_reply(&self, text: &str) {
        self.state.scripted.lock().unwrap().transaction_reply = text.to_string();
    }

    /// Text returned for free-form (summary) requests
    pub fn set_summary_reply(&self, text: &str) {
        self.state.scripted.lock().unwrap().summary_reply = text.to_string();
    }

    /// Answer every subsequent request with `status`
    pub fn fail_with(&self, status: StatusCode) {
        self.state.scripted.lock().unwrap().failure = Some(status);
    }

    /// Body of the most recent `generateContent` request
    pub fn last_request(&self) -> Option<Value> {
        self.state.scripted.lock().unwrap().last_request.clone()
    }

    /// `x-goog-api-key` header of the most recent request
    pub fn last_api_key(&self) -> Option<String> {
        self.state.scripted.lock().unwrap().last_api_key.clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({
        "name": format!("models/{}", model),
        "displayName": model,
    }))
}

async fn handle_generate(
    State(state): State<MockState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    if !model_action.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }
    state.calls.fetch_add(1, Ordering::SeqCst);

    let mut scripted = state.scripted.lock().unwrap();
    scripted.last_api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let wants_transaction = request
        .pointer("/generationConfig/responseSchema")
        .is_some();
    scripted.last_request = Some(request);

    if let Some(status) = scripted.failure {
        return (status, Json(json!({"error": {"message": "scripted failure"}}))).into_response();
    }

    let text = if wants_transaction {
        scripted.transaction_reply.clone()
    } else {
        scripted.summary_reply.clone()
    };

    Json(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}
