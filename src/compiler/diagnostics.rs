//! Structured diagnostic parsing.
//!
//! reflexc emits diagnostics as `FILE:LINE:COLUMN: TYPE: MESSAGE`, sometimes
//! followed by a `Suggestion:` line and indented continuation lines. The
//! parser walks the output line by line, keeps diagnostics in emission
//! order, and attaches suggestions and continuations to the most recent one.
//! Lines that are neither are left to the classifier.

use serde::{Deserialize, Serialize};

use super::classify::{DiagnosticCategory, classify_line};

/// One parsed compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file as printed by the compiler
    pub file: String,

    /// 1-based line number
    pub line: u32,

    /// 1-based column number
    pub column: u32,

    /// Verbatim TYPE token, e.g. "error" or "type error"
    pub kind: String,

    /// Message text, continuations space-joined
    pub message: String,

    /// Category classified from the full diagnostic line
    pub category: DiagnosticCategory,

    /// Compiler-proposed fix, when present
    pub suggestion: Option<String>,
}

/// Parse raw compiler output into ordered diagnostics.
///
/// Unbounded: callers cap how many they show, not how many exist.
pub fn parse_diagnostics(raw: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut current: Option<Diagnostic> = None;

    for line in raw.trim().lines() {
        if let Some(diagnostic) = parse_diagnostic_start(line) {
            if let Some(done) = current.take() {
                diagnostics.push(done);
            }
            current = Some(diagnostic);
        } else if let Some(text) = suggestion_text(line) {
            if let Some(diagnostic) = current.as_mut() {
                diagnostic.suggestion = (!text.is_empty()).then(|| text.to_string());
            }
        } else if is_continuation(line) {
            if let Some(diagnostic) = current.as_mut() {
                diagnostic.message.push(' ');
                diagnostic.message.push_str(line.trim());
            }
        }
        // anything else is classifier territory, not parser territory
    }

    if let Some(done) = current {
        diagnostics.push(done);
    }

    diagnostics
}

/// Try to parse a line as `FILE:LINE:COLUMN: TYPE: MESSAGE`.
///
/// File names may contain colons, so candidate splits are tried from the
/// right; the rightmost split whose tail fully parses wins.
fn parse_diagnostic_start(line: &str) -> Option<Diagnostic> {
    let colons: Vec<usize> = line.match_indices(':').map(|(i, _)| i).collect();
    for &idx in colons.iter().rev() {
        let file = &line[..idx];
        if file.is_empty() {
            continue;
        }
        if let Some((line_no, column, kind, message)) = parse_location_tail(&line[idx + 1..]) {
            return Some(Diagnostic {
                file: file.to_string(),
                line: line_no,
                column,
                kind,
                message,
                category: classify_line(line),
                suggestion: None,
            });
        }
    }
    None
}

/// Parse `LINE:COLUMN: TYPE: MESSAGE` after the file split.
fn parse_location_tail(rest: &str) -> Option<(u32, u32, String, String)> {
    let (line_part, rest) = rest.split_once(':')?;
    let line_no = parse_number(line_part)?;

    let (col_part, rest) = rest.split_once(':')?;
    let column = parse_number(col_part)?;

    let rest = rest.trim_start();
    let (kind, message) = rest.split_once(':')?;
    if !is_kind_token(kind) {
        return None;
    }

    let message = message.trim();
    if message.is_empty() {
        return None;
    }

    Some((line_no, column, kind.to_string(), message.to_string()))
}

fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// TYPE tokens are words separated by whitespace, nothing else
fn is_kind_token(text: &str) -> bool {
    !text.is_empty()
        && !text.ends_with(char::is_whitespace)
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
}

fn suggestion_text(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix("Suggestion:")
        .map(|text| text.trim())
}

/// Continuations are indented, non-blank lines
fn is_continuation(line: &str) -> bool {
    !line.trim().is_empty() && line.starts_with(char::is_whitespace)
}
