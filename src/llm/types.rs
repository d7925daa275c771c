//! LLM types for vLLM chat communication
//!
//! Message and request/reply types for the OpenAI-compatible chat
//! completions protocol that vLLM serves.

use serde::{Deserialize, Serialize};

/// Default sampling temperature; low because we want deterministic repairs
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default completion budget in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request to the LLM for a chat completion
///
/// The model identifier is filled in by the client; callers only supply
/// conversation content and sampling parameters.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Create a request with default sampling parameters
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max completion tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Total characters across all messages, for conversation summaries
    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }
}

/// Completed reply from the model
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub content: String,
    pub finish_reason: Option<String>,
}

impl ChatReply {
    /// Whether the model produced any usable text
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether generation stopped because the token budget ran out
    pub fn truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}
