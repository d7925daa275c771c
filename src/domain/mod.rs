//! Domain types for rfxgen
//!
//! This module contains the core session types:
//! - Candidate: the latest program text under test
//! - Transcript: the append-only conversation log
//! - SessionOutcome / SessionReport: how a session ended

pub mod candidate;
pub mod outcome;
pub mod transcript;

pub use candidate::Candidate;
pub use outcome::{SessionOutcome, SessionReport};
pub use transcript::Transcript;
