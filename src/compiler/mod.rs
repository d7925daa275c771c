//! Compiler integration: invoking reflexc, parsing its diagnostics, and
//! classifying its output lines.

pub mod classify;
pub mod diagnostics;
pub mod runner;

pub use classify::{classify_line, CompilationReport, DiagnosticCategory};
pub use diagnostics::{parse_diagnostics, Diagnostic};
pub use runner::{detect_compiler, CheckOutcome, CheckRunner};
