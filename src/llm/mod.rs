//! LLM Client Layer - vLLM chat completions with streaming
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - VllmClient implementation
//! - Streaming support

pub mod client;
pub mod streaming;
pub mod types;
pub mod vllm;

pub use client::{LlmClient, MockLlmClient};
pub use streaming::{
    ReplyAccumulator, StreamChunk, StreamDelta, StreamHandle, create_stream_channel,
    parse_stream_delta,
};
pub use types::{ChatReply, ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, Message, Role};
pub use vllm::{FALLBACK_MODEL, VllmClient, VllmConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify all public types are accessible
        let _role = Role::User;
        let _chunk = StreamChunk::Done;
        assert_eq!(FALLBACK_MODEL, "deepseek-coder-v2-lite-instruct-fp8");
    }
}
