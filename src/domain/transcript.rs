//! Append-only conversation log.
//!
//! A transcript starts with the system prompt and the task, then grows one
//! assistant turn per model reply and one user turn per feedback message.
//! Turns are never reordered or rewritten; correction happens by appending.

use serde::Serialize;

use crate::llm::types::{Message, Role};

/// Ordered log of conversation turns.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a conversation: one system turn plus one user (task) turn
    pub fn new(system_prompt: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(task)],
        }
    }

    /// Append the model's reply
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Append a feedback or instruction turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Read-only view of all turns, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total characters across all turns, for conversation summaries
    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }

    /// Number of assistant turns so far (equals prior generation attempts)
    pub fn assistant_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }

    /// Content of the newest assistant turn, if any
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
