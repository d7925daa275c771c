//! Categorized batch feedback.
//!
//! Built from the classified [`CompilationReport`] rather than the parsed
//! diagnostics so that error lines the parser cannot structure still reach
//! the model. Sections are capped per category; a fixing strategy is
//! appended whenever at least one error category is populated.

use crate::compiler::{CompilationReport, Diagnostic};
use crate::domain::Candidate;

use super::FeedbackComposer;

const CATEGORY_CAP: usize = 10;

/// Batch error report with per-category sections and a fixing strategy
pub struct RichComposer;

impl FeedbackComposer for RichComposer {
    fn compose(&self, candidate: &Candidate, _diagnostics: &[Diagnostic], raw: &str) -> String {
        let report = CompilationReport::from_output(raw);
        let total_errors = report.error_count();

        let mut out = String::new();
        out.push_str("COMPILATION OUTPUT ANALYSIS - BATCH ERROR REPORT:\n");
        out.push_str(&"=".repeat(60));
        out.push('\n');

        section(
            &mut out,
            "SYNTAX ERRORS",
            &report.syntax,
            "more syntax errors (fix these first to resolve cascading issues)",
        );
        section(
            &mut out,
            "TYPE/DECLARATION ERRORS",
            &report.type_or_semantic,
            "more type errors",
        );
        section(&mut out, "LINKER ERRORS", &report.linker, "more linker errors");
        section(&mut out, "WARNINGS", &report.warnings, "more warnings");

        if total_errors > 0 {
            out.push_str(&format!(
                "\nBATCH FIXING SUGGESTIONS ({total_errors} errors total):\n"
            ));
            if !report.syntax.is_empty() {
                out.push_str("  For syntax errors:\n");
                out.push_str("    - Fix missing/extra braces, parentheses, semicolons\n");
                out.push_str("    - Check for typos in keywords and operators\n");
                out.push_str("    - Ensure proper ReflexScript syntax structure\n");
            }
            if !report.type_or_semantic.is_empty() {
                out.push_str("  For type/declaration errors:\n");
                out.push_str("    - Verify all variables are declared with correct types\n");
                out.push_str("    - Check unit annotations (e.g., i16[m], u8[Hz])\n");
                out.push_str("    - Ensure type compatibility in expressions\n");
            }
            out.push_str("\n  BATCH FIXING STRATEGY:\n");
            out.push_str("    1. Address ALL errors of the same type together\n");
            out.push_str("    2. Start with syntax errors first (they often cascade)\n");
            out.push_str("    3. Then fix type/declaration errors\n");
            out.push_str("    4. Finally address linker issues\n");
            out.push_str("    5. Re-compile to check if fixes resolved multiple errors\n");
        }

        let mut counts = Vec::new();
        if !report.syntax.is_empty() {
            counts.push(format!("{} syntax", report.syntax.len()));
        }
        if !report.type_or_semantic.is_empty() {
            counts.push(format!("{} type", report.type_or_semantic.len()));
        }
        if !report.linker.is_empty() {
            counts.push(format!("{} linker", report.linker.len()));
        }
        if !report.warnings.is_empty() {
            counts.push(format!("{} warnings", report.warnings.len()));
        }

        if !counts.is_empty() {
            out.push_str(&format!(
                "\nSUMMARY: Found {} errors/warnings\n",
                counts.join(", ")
            ));
            out.push_str(
                "FIRST 10 ERRORS OF EACH TYPE SHOWN - Fix these to resolve many cascading issues\n",
            );
            if total_errors > 30 {
                out.push_str(
                    "Many errors detected - focus on syntax errors first as they often cause cascading failures\n",
                );
            }
        } else {
            out.push_str("\nCompilation failed without itemizable errors. Raw compiler output:\n");
            out.push_str(raw.trim());
            out.push('\n');
        }

        out.push_str("\nReflexScript compilation FAILED\n");
        out.push_str(
            "\nACTION REQUIRED: Review the compilation errors above and fix the syntax issues before proceeding.\n",
        );

        out.push_str("\n### Your Code That Failed:\n```reflexscript\n");
        out.push_str(&candidate.source);
        out.push_str("\n```\n\nOutput the FIXED code in a ```reflexscript block.");
        out
    }
}

fn section(out: &mut String, title: &str, entries: &[String], remainder: &str) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title} ({} total):\n", entries.len()));
    for (i, entry) in entries.iter().take(CATEGORY_CAP).enumerate() {
        out.push_str(&format!("  {}. {entry}\n", i + 1));
    }
    if entries.len() > CATEGORY_CAP {
        out.push_str(&format!(
            "  ... and {} {remainder}\n",
            entries.len() - CATEGORY_CAP
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate::new("reflex demo { loop {} }", 1)
    }

    #[test]
    fn test_compose_groups_by_category() {
        let raw = "main.rfx:1:1: error: expected '{'\n\
                   undeclared variable 'x' in update block\n\
                   main.rfx:9:2: warning: unused state 'y'";

        let message = RichComposer.compose(&candidate(), &[], raw);
        assert!(message.contains("SYNTAX ERRORS (1 total):"));
        assert!(message.contains("TYPE/DECLARATION ERRORS (1 total):"));
        assert!(message.contains("WARNINGS (1 total):"));
        assert!(message.contains("1. main.rfx:1:1: error: expected '{'"));
    }

    #[test]
    fn test_compose_caps_each_category_at_ten() {
        let mut raw = String::new();
        for i in 1..=13 {
            raw.push_str(&format!("main.rfx:{i}:1: error: expected token {i}\n"));
        }

        let message = RichComposer.compose(&candidate(), &[], &raw);
        assert!(message.contains("10. main.rfx:10:1"));
        assert!(!message.contains("11. main.rfx:11:1"));
        assert!(message.contains("... and 3 more syntax errors"));
    }

    #[test]
    fn test_batch_suggestions_only_when_errors_exist() {
        let warnings_only = "main.rfx:3:1: warning: unused input 'a'";
        let message = RichComposer.compose(&candidate(), &[], warnings_only);

        assert!(!message.contains("BATCH FIXING SUGGESTIONS"));
        assert!(message.contains("SUMMARY: Found 1 warnings errors/warnings"));
    }

    #[test]
    fn test_batch_strategy_ordering_present_with_errors() {
        let raw = "main.rfx:1:1: error: expected '{'\n\
                   undeclared variable 'speed'";
        let message = RichComposer.compose(&candidate(), &[], raw);

        assert!(message.contains("BATCH FIXING SUGGESTIONS (2 errors total):"));
        assert!(message.contains("For syntax errors:"));
        assert!(message.contains("For type/declaration errors:"));
        assert!(message.contains("1. Address ALL errors of the same type together"));
    }

    #[test]
    fn test_summary_counts_populated_categories_only() {
        let raw = "main.rfx:1:1: error: expected '{'\n\
                   main.rfx:2:1: error: expected '}'\n\
                   ld: cannot find -lreflexrt";
        let message = RichComposer.compose(&candidate(), &[], raw);

        assert!(message.contains("SUMMARY: Found 2 syntax, 1 linker errors/warnings"));
    }

    #[test]
    fn test_no_itemizable_errors_falls_back_to_raw() {
        let raw = "the compiler exploded in an unrecognizable way";
        let message = RichComposer.compose(&candidate(), &[], raw);

        assert!(message.contains("Compilation failed without itemizable errors"));
        assert!(message.contains("exploded in an unrecognizable way"));
        assert!(!message.contains("SUMMARY:"));
    }

    #[test]
    fn test_informational_lines_excluded() {
        let raw = "Phase: parsing\nmain.rfx:1:1: error: expected '{'";
        let message = RichComposer.compose(&candidate(), &[], raw);

        assert!(message.contains("error: expected '{'"));
        assert!(!message.contains("Phase: parsing"));
    }

    #[test]
    fn test_compose_embeds_candidate_and_instruction() {
        let message = RichComposer.compose(&candidate(), &[], "main.rfx:1:1: error: bad");

        assert!(message.contains("### Your Code That Failed:"));
        assert!(message.contains("```reflexscript\nreflex demo { loop {} }\n```"));
        assert!(message.ends_with("Output the FIXED code in a ```reflexscript block."));
    }
}
