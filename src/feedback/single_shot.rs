//! Self-contained retry messages for fresh-context sessions.
//!
//! Without accumulated history each retry must carry everything: the
//! original request, the failing code, the errors, and the unit rules.
//! Errors are deduplicated by source line so one broken declaration does
//! not flood the message with cascading repeats.

use std::collections::HashSet;

use crate::compiler::Diagnostic;
use crate::domain::Candidate;

const MAX_UNIQUE_ERRORS: usize = 10;

/// Keep at most one diagnostic per source line, first occurrence wins.
pub fn dedup_by_line(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics.iter().filter(|d| seen.insert(d.line)).collect()
}

/// Compose a complete retry prompt from the task, the failing candidate,
/// and its diagnostics.
pub fn compose_single_shot(task: &str, candidate: &Candidate, diagnostics: &[Diagnostic]) -> String {
    let unique = dedup_by_line(diagnostics);

    let mut error_lines = Vec::new();
    for diagnostic in unique.iter().take(MAX_UNIQUE_ERRORS) {
        let mut entry = format!(
            "- Line {}, Column {}: [{}] {}",
            diagnostic.line, diagnostic.column, diagnostic.kind, diagnostic.message
        );
        if let Some(suggestion) = &diagnostic.suggestion {
            entry.push_str(&format!("\n  Suggestion: {suggestion}"));
        }
        error_lines.push(entry);
    }

    let mut errors_text = error_lines.join("\n");
    if unique.len() > MAX_UNIQUE_ERRORS {
        errors_text.push_str(&format!(
            "\n... and {} more errors on other lines",
            unique.len() - MAX_UNIQUE_ERRORS
        ));
    }

    format!(
        r#"## TASK: Fix the compilation errors in the code below.

## Original Request
{task}

## YOUR CODE (fix this code)
```reflexscript
{code}
```

## Compiler Errors
{errors_text}

## VALID UNITS (only these work)
`[m]` `[rad]` `[s]` `[ms]` `[Hz]` `[mps]` `[radps]` `[deg]` `[degC]` `[degF]` `[mm]` `[cm]` `[km]` `[kg]` `[g]`

**INVALID**: `[Nm]` `[rad/s]` `[m/s]` - NO compound units with `/`

## Common Fixes
- `i16[Nm]` becomes `i16` (Nm not valid)
- `i16[rad/s]` becomes `i16[radps]`
- `target_angle` undefined: add it to the `input:` section
- float comparison: use integer scaled values

## SAFETY BLOCK SYNTAX (this is often wrong!)
The safety block uses `variable in range` syntax, NOT type declarations:
```
// WRONG - do NOT put types in safety block:
safety {{ input: {{ target_angle: i16[rad] }} }}

// CORRECT - use ranges:
safety {{ input: {{ target_angle in -314..314 }} }}
```

## Instructions
1. **Fix YOUR CODE above** - do NOT start over or copy examples
2. **Add missing variables** - if `target_angle` is undefined, add `target_angle: i16[rad]` to the input section
3. **Fix invalid units** - replace `[Nm]` with no unit, `[rad/s]` with `[radps]`
4. **Output the FIXED version** of YOUR CODE in a ```reflexscript block

IMPORTANT: Output a FIXED version of the code above. Do NOT output example code or start from scratch."#,
        code = candidate.source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DiagnosticCategory;

    fn diag(line: u32, message: &str) -> Diagnostic {
        Diagnostic {
            file: "main.rfx".to_string(),
            line,
            column: 2,
            kind: "error".to_string(),
            message: message.to_string(),
            category: DiagnosticCategory::Syntax,
            suggestion: None,
        }
    }

    #[test]
    fn test_dedup_keeps_first_per_line() {
        let diagnostics = vec![
            diag(3, "first on three"),
            diag(3, "second on three"),
            diag(5, "on five"),
        ];

        let unique = dedup_by_line(&diagnostics);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].message, "first on three");
        assert_eq!(unique[1].message, "on five");
    }

    #[test]
    fn test_compose_includes_task_and_candidate() {
        let candidate = Candidate::new("reflex pid { loop {} }", 2);
        let message = compose_single_shot("build a PID controller", &candidate, &[]);

        assert!(message.contains("## Original Request\nbuild a PID controller"));
        assert!(message.contains("```reflexscript\nreflex pid { loop {} }\n```"));
        assert!(message.contains("`[radps]`"));
    }

    #[test]
    fn test_compose_renders_error_entries() {
        let candidate = Candidate::new("x", 1);
        let mut with_fix = diag(4, "unknown unit");
        with_fix.suggestion = Some("use [radps]".to_string());

        let message = compose_single_shot("task", &candidate, &[with_fix]);
        assert!(message.contains("- Line 4, Column 2: [error] unknown unit"));
        assert!(message.contains("\n  Suggestion: use [radps]"));
    }

    #[test]
    fn test_compose_caps_at_ten_unique_lines() {
        let candidate = Candidate::new("x", 1);
        let diagnostics: Vec<Diagnostic> =
            (1..=12).map(|i| diag(i, &format!("problem {i}"))).collect();

        let message = compose_single_shot("task", &candidate, &diagnostics);
        assert!(message.contains("problem 10"));
        assert!(!message.contains("problem 11"));
        assert!(message.contains("... and 2 more errors on other lines"));
    }

    #[test]
    fn test_repeated_lines_do_not_consume_the_cap() {
        let candidate = Candidate::new("x", 1);
        let mut diagnostics = Vec::new();
        for _ in 0..20 {
            diagnostics.push(diag(1, "same line repeated"));
        }
        diagnostics.push(diag(2, "distinct line"));

        let message = compose_single_shot("task", &candidate, &diagnostics);
        assert!(message.contains("distinct line"));
        assert!(!message.contains("more errors on other lines"));
    }
}
