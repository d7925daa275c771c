//! Rfxgen - compiler-verified ReflexScript generation
//!
//! Rfxgen drives an LLM through a generate / check / feedback loop: every
//! candidate is handed to the reflexc compiler, and structured diagnostics
//! flow back into the conversation until the code compiles or the iteration
//! budget runs out.

pub mod artifact;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod id;
pub mod llm;
pub mod prompt;
pub mod runner;

pub use error::{Result, RfxgenError};
