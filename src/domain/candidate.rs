//! Candidate program text under test.

use serde::{Deserialize, Serialize};

/// The latest extracted program text and the iteration that produced it.
///
/// A candidate survives extraction failures on later iterations: once the
/// model has produced something compilable-looking we keep it until a newer
/// extraction replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Source text exactly as extracted (trimmed)
    pub source: String,

    /// 1-based iteration that produced this text
    pub iteration: u32,
}

impl Candidate {
    /// Create a candidate from extracted source
    pub fn new(source: impl Into<String>, iteration: u32) -> Self {
        Self {
            source: source.into(),
            iteration,
        }
    }

    /// 1-based source line lookup, used for error snippets in feedback
    pub fn line(&self, number: u32) -> Option<&str> {
        if number == 0 {
            return None;
        }
        self.source.lines().nth(number as usize - 1)
    }

    /// Number of source lines
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}
