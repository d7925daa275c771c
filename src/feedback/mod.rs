//! Feedback composition for failed checks.
//!
//! After a failed compile, the diagnostics are turned into the next user
//! message. Two styles exist: a minimal listing for small models that lose
//! the thread in long reports, and a categorized batch report for capable
//! ones. Fresh-context sessions use the single-shot variant instead, which
//! restates the whole task each round.

pub mod minimal;
pub mod rich;
pub mod single_shot;

pub use minimal::MinimalComposer;
pub use rich::RichComposer;
pub use single_shot::{compose_single_shot, dedup_by_line};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compiler::Diagnostic;
use crate::domain::Candidate;
use crate::error::RfxgenError;

/// Feedback style for failed checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackMode {
    /// Short, literal error listing
    Minimal,

    /// Categorized batch report with fixing strategy
    #[default]
    Rich,
}

impl FeedbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackMode::Minimal => "minimal",
            FeedbackMode::Rich => "rich",
        }
    }
}

impl fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeedbackMode {
    type Err = RfxgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(FeedbackMode::Minimal),
            "rich" => Ok(FeedbackMode::Rich),
            other => Err(RfxgenError::Config(format!(
                "unknown feedback mode: {other} (expected 'minimal' or 'rich')"
            ))),
        }
    }
}

/// Turns a failed check into the next user message
pub trait FeedbackComposer: Send + Sync {
    fn compose(&self, candidate: &Candidate, diagnostics: &[Diagnostic], raw: &str) -> String;
}

/// Composer for the given mode
pub fn composer_for(mode: FeedbackMode) -> Box<dyn FeedbackComposer> {
    match mode {
        FeedbackMode::Minimal => Box::new(MinimalComposer),
        FeedbackMode::Rich => Box::new(RichComposer),
    }
}
