//! Core LLM client trait and test mock

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

use super::streaming::StreamChunk;
use super::types::{ChatReply, ChatRequest};

/// Client for an OpenAI-compatible chat completion server
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply>;

    /// Streaming completion; fragments are forwarded on `chunk_tx` as they
    /// arrive and the fully accumulated reply is returned
    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatReply>;

    /// Liveness probe against the server
    async fn healthy(&self) -> bool;

    /// The model identifier requests are issued against
    fn model(&self) -> &str;
}

/// Scripted mock client for loop tests.
///
/// Replies are returned in order; once the script is exhausted every further
/// call yields an empty reply. Every request is recorded for inspection.
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicU32,
    healthy: bool,
}

impl MockLlmClient {
    /// Mock that answers with the given texts in order
    pub fn new(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Mock with full control over each call's outcome
    pub fn with_results(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            healthy: true,
        }
    }

    /// Mock whose health probe fails
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: ChatRequest) -> Result<ChatReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(ChatReply {
                content,
                finish_reason: Some("stop".to_string()),
            }),
            Some(Err(err)) => Err(err),
            None => Ok(ChatReply::default()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply> {
        self.next_reply(request)
    }

    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatReply> {
        let reply = self.next_reply(request)?;
        if !reply.content.is_empty() {
            let _ = chunk_tx.send(StreamChunk::Text(reply.content.clone())).await;
        }
        let _ = chunk_tx.send(StreamChunk::Done).await;
        Ok(reply)
    }

    async fn healthy(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
