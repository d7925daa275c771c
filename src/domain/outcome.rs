//! Session outcome types.
//!
//! This module defines the result types for a generation session.

use std::path::PathBuf;

use super::candidate::Candidate;

/// Terminal outcome of a generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The compiler accepted a candidate
    Success,
    /// Iteration budget exhausted without a clean compile
    Exhausted,
    /// Interrupted by the user between operations
    Cancelled,
}

/// Final report for one session run.
///
/// Fatal conditions never reach this type; they surface as errors from the
/// session instead.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: SessionOutcome,

    /// Iterations actually consumed
    pub iterations: u32,

    /// Last candidate written to the artifact path, if any
    pub candidate: Option<Candidate>,

    /// Where the candidate artifact was written
    pub output_path: PathBuf,
}

impl SessionReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == SessionOutcome::Success
    }
}
