//! vLLM server client implementation
//!
//! Implements the LlmClient trait against a vLLM instance serving the
//! OpenAI-compatible chat completions API. vLLM is typically unauthenticated,
//! but a 401/403 from a proxy in front of it is terminal and never retried.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::error::{Result, RfxgenError};
use crate::llm::client::LlmClient;
use crate::llm::streaming::{ReplyAccumulator, StreamChunk, parse_stream_delta};
use crate::llm::types::{ChatReply, ChatRequest};

/// Model id assumed when /v1/models discovery fails
pub const FALLBACK_MODEL: &str = "deepseek-coder-v2-lite-instruct-fp8";

/// Overall budget for one completion request, streaming included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget for the /health probe
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for /v1/models discovery
const MODELS_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the vLLM client
#[derive(Debug, Clone)]
pub struct VllmConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for VllmConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl VllmConfig {
    /// Create a config for a specific server address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Set the overall request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server base URL
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// vLLM chat completions client
pub struct VllmClient {
    client: Client,
    config: VllmConfig,
    model: String,
}

impl VllmClient {
    /// Create a client with a known model id, without touching the network
    pub fn with_model(config: VllmConfig, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RfxgenError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            model: model.into(),
        })
    }

    /// Probe the server and discover the served model.
    ///
    /// Fails with `ServerUnreachable` when the health endpoint does not
    /// answer; falls back to [`FALLBACK_MODEL`] when discovery fails.
    pub async fn connect(config: VllmConfig) -> Result<Self> {
        let mut client = Self::with_model(config, FALLBACK_MODEL)?;

        if !client.healthy().await {
            return Err(RfxgenError::ServerUnreachable(client.config.base_url()));
        }

        match client.discover_model().await {
            Some(model) => client.model = model,
            None => log::warn!("model discovery failed, assuming {}", FALLBACK_MODEL),
        }

        Ok(client)
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url())
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url())
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url())
    }

    /// First model id advertised by /v1/models, if any
    pub async fn discover_model(&self) -> Option<String> {
        let response = self
            .client
            .get(self.models_url())
            .timeout(MODELS_TIMEOUT)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: Value = response.json().await.ok()?;
        parse_model_list(&body)
    }

    /// Build the JSON body for a chat completions request
    fn build_request(&self, request: &ChatRequest, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "stream": stream,
        })
    }

    /// Parse a non-streaming chat completions response
    fn parse_response(&self, body: Value) -> Result<ChatReply> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| RfxgenError::Llm("response has no choices".to_string()))?;

        let content = choice["message"]["content"].as_str().unwrap_or("").to_string();
        let finish_reason = choice["finish_reason"].as_str().map(|s| s.to_string());

        Ok(ChatReply {
            content,
            finish_reason,
        })
    }

    /// Send a non-streaming request to the chat endpoint
    async fn send_request(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RfxgenError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(RfxgenError::AuthRejected(status.as_u16()));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RfxgenError::Llm(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RfxgenError::Llm(format!("Failed to parse response: {}", e)))
    }
}

/// First model id in a /v1/models payload
fn parse_model_list(body: &Value) -> Option<String> {
    body.get("data")?
        .get(0)?
        .get("id")?
        .as_str()
        .map(|s| s.to_string())
}

fn map_stream_error(err: reqwest_eventsource::Error) -> RfxgenError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _)
            if status.as_u16() == 401 || status.as_u16() == 403 =>
        {
            RfxgenError::AuthRejected(status.as_u16())
        }
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
            RfxgenError::Llm(format!("API error {}", status))
        }
        other => RfxgenError::Llm(format!("Stream error: {}", other)),
    }
}

#[async_trait]
impl LlmClient for VllmClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply> {
        let body = self.build_request(&request, false);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatReply> {
        let body = self.build_request(&request, true);
        let builder = self.client.post(self.chat_url()).json(&body);
        let mut source = EventSource::new(builder)
            .map_err(|e| RfxgenError::Llm(format!("Failed to open stream: {}", e)))?;

        let mut accumulator = ReplyAccumulator::new();
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => {
                    if message.data == "[DONE]" {
                        break;
                    }
                    if let Some(delta) = parse_stream_delta(&message.data) {
                        if let Some(text) = accumulator.push(delta) {
                            let _ = chunk_tx.send(StreamChunk::Text(text)).await;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(err) => {
                    source.close();
                    let mapped = map_stream_error(err);
                    let _ = chunk_tx.send(StreamChunk::Error(mapped.to_string())).await;
                    return Err(mapped);
                }
            }
        }
        source.close();

        let _ = chunk_tx.send(StreamChunk::Done).await;
        Ok(accumulator.into_reply())
    }

    async fn healthy(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for VllmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VllmClient")
            .field("base_url", &self.config.base_url())
            .field("model", &self.model)
            .finish()
    }
}
