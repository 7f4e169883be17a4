use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::BackendEndpoint;
use crate::error::ChatError;

/// Wire payload for `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Something that turns a user message into a reply.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

#[derive(Clone)]
pub struct HttpChatService {
    client: Client,
    chat_url: String,
}

impl HttpChatService {
    pub fn new(endpoint: &BackendEndpoint, timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Connectivity(e.to_string()))?;

        Ok(Self {
            client,
            chat_url: endpoint.chat_url(),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let started = Instant::now();
        tracing::debug!(url = %self.chat_url, chars = request.message.chars().count(), "sending chat request");

        let outcome = match self.client.post(&self.chat_url).json(request).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => interpret_reply(status, &body),
                    Err(e) => Err(ChatError::Connectivity(e.to_string())),
                }
            }
            Err(e) => Err(ChatError::Connectivity(e.to_string())),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(reply) => tracing::debug!(elapsed_ms, chars = reply.chars().count(), "chat reply received"),
            Err(e) => tracing::warn!(elapsed_ms, kind = e.kind(), error = %e, "chat request failed"),
        }
        outcome
    }
}

/// Classify a response body.
///
/// An application error flag wins over the HTTP status, so a 4xx carrying
/// `{"error": true, "response": "..."}` still surfaces the server's text.
pub fn interpret_reply(status: u16, body: &str) -> Result<String, ChatError> {
    let reply: Option<ChatReply> = serde_json::from_str(body).ok();

    if let Some(reply) = &reply {
        if reply.error.as_ref().is_some_and(is_truthy) {
            let message = reply
                .response
                .as_ref()
                .and_then(non_empty_str)
                .or_else(|| reply.error.as_ref().and_then(non_empty_str));
            return Err(ChatError::Application(message));
        }
    }

    if !(200..300).contains(&status) {
        return Err(ChatError::Server { status });
    }

    match reply.and_then(|r| r.response) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(ChatError::MalformedResponse(format!(
            "`response` is not a string: {}",
            other
        ))),
        None => Err(ChatError::MalformedResponse(
            "missing `response` field".to_string(),
        )),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
