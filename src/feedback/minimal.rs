//! Minimal feedback for small models.
//!
//! Short and literal: the first few errors with the offending source lines,
//! the unit cheat sheet, and the code to fix. No categorization, no
//! strategy sections.

use crate::compiler::Diagnostic;
use crate::domain::Candidate;

use super::FeedbackComposer;

const MAX_ERRORS: usize = 5;

const UNITS_REFERENCE: &str = "VALID UNITS: [m] [rad] [s] [ms] [Hz] [mps] [radps] [deg] [degC] [mm] [cm] [kg]\n\
     INVALID: [Nm] [rad/s] [m/s] - NO slash in units";

/// Terse error listing suited to small instruction-tuned models
pub struct MinimalComposer;

impl FeedbackComposer for MinimalComposer {
    fn compose(&self, candidate: &Candidate, diagnostics: &[Diagnostic], _raw: &str) -> String {
        let mut out = String::new();
        out.push_str("COMPILATION ERROR. Fix the code below.\n\n");
        out.push_str("ERRORS:\n");

        for diagnostic in diagnostics.iter().take(MAX_ERRORS) {
            out.push_str(&format!(
                "  Line {}: {}\n",
                diagnostic.line, diagnostic.message
            ));
            if let Some(suggestion) = &diagnostic.suggestion {
                out.push_str(&format!("    FIX: {suggestion}\n"));
            }
            if let Some(code) = candidate.line(diagnostic.line) {
                out.push_str(&format!("    CODE: {}\n", code.trim()));
            }
        }
        if diagnostics.len() > MAX_ERRORS {
            out.push_str(&format!(
                "  ... {} more errors\n",
                diagnostics.len() - MAX_ERRORS
            ));
        }

        out.push('\n');
        out.push_str(UNITS_REFERENCE);
        out.push_str("\n\nYOUR CODE:\n```reflexscript\n");
        out.push_str(&candidate.source);
        out.push_str("\n```\n\nFix the errors and output the complete corrected code in a ```reflexscript block.");
        out
    }
}
