//! Streaming support for LLM responses.
//!
//! vLLM streams chat completions as Server-Sent Events. Each `data:` payload
//! carries an incremental delta; `data: [DONE]` terminates the stream.

use serde::Deserialize;
use tokio::sync::mpsc;

use super::types::ChatReply;

/// Chunk types emitted to consumers during streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Text content delta
    Text(String),
    /// Stream completed successfully
    Done,
    /// Stream error
    Error(String),
}

/// Handle for receiving streaming chunks.
pub struct StreamHandle {
    /// Receiver for stream chunks
    pub receiver: mpsc::Receiver<StreamChunk>,
}

impl StreamHandle {
    /// Create a new stream handle with the given receiver.
    pub fn new(receiver: mpsc::Receiver<StreamChunk>) -> Self {
        Self { receiver }
    }

    /// Receive the next chunk from the stream.
    pub async fn recv(&mut self) -> Option<StreamChunk> {
        self.receiver.recv().await
    }

    /// Collect all text from the stream into a single string.
    pub async fn collect_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.recv().await {
            match chunk {
                StreamChunk::Text(t) => text.push_str(&t),
                StreamChunk::Done | StreamChunk::Error(_) => break,
            }
        }
        text
    }
}

/// Builder for stream handle pairs (sender and handle).
pub fn create_stream_channel(buffer_size: usize) -> (mpsc::Sender<StreamChunk>, StreamHandle) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (tx, StreamHandle::new(rx))
}

/// One parsed delta from an SSE data payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDelta {
    /// Incremental text, absent on role-announcement and final chunks
    pub content: Option<String>,
    /// Set on the final content-bearing chunk ("stop", "length", ...)
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse one SSE `data:` payload into a StreamDelta.
///
/// Returns `None` for `[DONE]`, empty payloads, and anything that is not a
/// well-formed chunk; a malformed payload must not abort the stream.
pub fn parse_stream_delta(data: &str) -> Option<StreamDelta> {
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let payload: ChunkPayload = serde_json::from_str(data).ok()?;
    let choice = payload.choices.into_iter().next()?;
    Some(StreamDelta {
        content: choice.delta.content,
        finish_reason: choice.finish_reason,
    })
}

/// Accumulates stream deltas into a final reply.
#[derive(Debug, Default)]
pub struct ReplyAccumulator {
    content: String,
    finish_reason: Option<String>,
}

impl ReplyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one delta, returning the text fragment (if any) for echoing.
    pub fn push(&mut self, delta: StreamDelta) -> Option<String> {
        if let Some(reason) = delta.finish_reason {
            self.finish_reason = Some(reason);
        }
        if let Some(text) = delta.content {
            self.content.push_str(&text);
            return Some(text);
        }
        None
    }

    /// Finish accumulation into the reply.
    pub fn into_reply(self) -> ChatReply {
        ChatReply {
            content: self.content,
            finish_reason: self.finish_reason,
        }
    }
}
