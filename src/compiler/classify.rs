//! Diagnostic classification.
//!
//! reflexc interleaves real diagnostics with analysis chatter (WCET
//! estimates, safety verdicts, phase banners). Classification is a single
//! ordered pass of case-insensitive substring rules; the first matching
//! category wins and anything left over is `Other`, so every non-blank line
//! lands in exactly one bucket.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of one compiler output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Analysis results and progress banners, never actionable
    Informational,
    /// Parse-level problems, including any formatted `error:` line
    Syntax,
    /// Type, declaration, and semantic-analysis problems
    TypeOrSemantic,
    /// Link-stage problems
    Linker,
    /// Non-fatal complaints
    Warning,
    /// Everything else, including generic failure chatter
    Other,
}

impl DiagnosticCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCategory::Informational => "informational",
            DiagnosticCategory::Syntax => "syntax",
            DiagnosticCategory::TypeOrSemantic => "type",
            DiagnosticCategory::Linker => "linker",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Other => "other",
        }
    }

    /// Whether lines of this category count toward the error total
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DiagnosticCategory::Syntax
                | DiagnosticCategory::TypeOrSemantic
                | DiagnosticCategory::Linker
        )
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered classification rules; earlier rows shadow later ones.
///
/// Note the asymmetry on purpose: `error:` (with colon) gates Syntax, so a
/// formatted `type error:` line is Syntax by precedence, while bare `linker
/// error` text still reaches the Linker row.
const CLASSIFY_RULES: &[(DiagnosticCategory, &[&str])] = &[
    (
        DiagnosticCategory::Informational,
        &[
            "safety analysis results",
            "safety properties: verified",
            "estimated wcet",
            "estimated stack",
            "estimated state",
            "max loop depth",
            "max stack depth",
            "execution rate",
            "platform:",
            "toolchain:",
            "compilation complete",
            "build successful",
            "phase:",
            "checking:",
            "processing:",
        ],
    ),
    (
        DiagnosticCategory::Syntax,
        &[
            "error:",
            "syntax error",
            "parse error",
            "expected",
            "missing",
            "unexpected token",
            "invalid syntax",
            "malformed",
        ],
    ),
    (
        DiagnosticCategory::TypeOrSemantic,
        &[
            "type error",
            "undefined",
            "undeclared",
            "incompatible types",
            "type mismatch",
            "cannot convert",
            "semantic error",
            "analysis error",
        ],
    ),
    (
        DiagnosticCategory::Linker,
        &[
            "undefined reference",
            "ld:",
            "cannot find -l",
            "unresolved symbol",
            "linker error",
            "link error",
        ],
    ),
    (
        DiagnosticCategory::Warning,
        &["warning:", "deprecated", "unused"],
    ),
];

/// Classify one output line. Total: every input maps to some category.
pub fn classify_line(line: &str) -> DiagnosticCategory {
    let lower = line.to_lowercase();
    for (category, patterns) in CLASSIFY_RULES {
        if patterns.iter().any(|p| lower.contains(p)) {
            return *category;
        }
    }
    DiagnosticCategory::Other
}

/// Compiler output bucketed by category, order preserved within buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationReport {
    pub syntax: Vec<String>,
    pub type_or_semantic: Vec<String>,
    pub linker: Vec<String>,
    pub warnings: Vec<String>,
    pub informational: Vec<String>,
    pub other: Vec<String>,
}

impl CompilationReport {
    /// Bucket every non-blank line of raw compiler output
    pub fn from_output(raw: &str) -> Self {
        let mut report = Self::default();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match classify_line(line) {
                DiagnosticCategory::Informational => report.informational.push(line.to_string()),
                DiagnosticCategory::Syntax => report.syntax.push(line.to_string()),
                DiagnosticCategory::TypeOrSemantic => {
                    report.type_or_semantic.push(line.to_string())
                }
                DiagnosticCategory::Linker => report.linker.push(line.to_string()),
                DiagnosticCategory::Warning => report.warnings.push(line.to_string()),
                DiagnosticCategory::Other => report.other.push(line.to_string()),
            }
        }
        report
    }

    /// Lines in the three error categories combined
    pub fn error_count(&self) -> usize {
        self.syntax.len() + self.type_or_semantic.len() + self.linker.len()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// One-line count summary for iteration output
    pub fn summary(&self) -> String {
        format!(
            "{} syntax, {} type, {} linker, {} warning(s)",
            self.syntax.len(),
            self.type_or_semantic.len(),
            self.linker.len(),
            self.warnings.len()
        )
    }
}
