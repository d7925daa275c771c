//! Candidate extraction from model replies.
//!
//! Models wrap code in markdown fences most of the time, but not always.
//! Extraction tries three strategies in order and takes the first hit:
//!
//! 1. A ```reflexscript tagged fence.
//! 2. The first generic ``` fence whose content contains `reflex ` (the
//!    declaration keyword), so prose blocks are rejected.
//! 3. A bare scan from the first `reflex ` keyword to the brace that closes
//!    its top-level block.
//!
//! Each strategy yields the whole candidate or nothing; results are never
//! merged. An empty tagged fence means no candidate.

/// Opening fence for tagged ReflexScript blocks
const FENCE_TAGGED: &str = "```reflexscript";

/// Generic fence delimiter
const FENCE: &str = "```";

/// Declaration keyword that starts every ReflexScript unit
const DECL_KEYWORD: &str = "reflex ";

/// Extract ReflexScript source from a model reply.
///
/// Returns the trimmed candidate text, or `None` when no strategy produces
/// usable code.
pub fn extract_candidate(reply: &str) -> Option<String> {
    if let Some(body) = find_fence_body(reply, FENCE_TAGGED) {
        let text = body.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    if let Some(body) = find_fence_body(reply, FENCE) {
        let text = body.trim();
        if !text.is_empty() && text.contains(DECL_KEYWORD) {
            return Some(text.to_string());
        }
        // a prose block does not stop the keyword scan below
    }

    keyword_span(reply)
}

/// Find the body of the first well-formed fence opened by `opener`.
///
/// The opener must be followed by optional horizontal whitespace and a
/// newline; the body runs to the next ``` after that. Occurrences whose
/// opener line carries other text are skipped.
fn find_fence_body<'a>(reply: &'a str, opener: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(pos) = reply[search_from..].find(opener) {
        let opener_at = search_from + pos;
        let rest = &reply[opener_at + opener.len()..];

        let Some(newline) = rest.find('\n') else {
            return None;
        };
        if rest[..newline]
            .chars()
            .all(|c| matches!(c, ' ' | '\t' | '\r'))
        {
            let body = &rest[newline + 1..];
            return body.find(FENCE).map(|end| &body[..end]);
        }

        // overlapping scan, a longer backtick run may still open a fence
        search_from = opener_at + 1;
    }
    None
}

/// Scan from the first `reflex ` keyword to the matching close of its
/// top-level brace block. No balanced close means no candidate.
fn keyword_span(reply: &str) -> Option<String> {
    let start = reply.find(DECL_KEYWORD)?;
    let tail = &reply[start..];

    let mut depth = 0i32;
    let mut in_code = false;
    let mut end = 0usize;
    for (i, ch) in tail.char_indices() {
        match ch {
            '{' => {
                depth += 1;
                in_code = true;
            }
            '}' => {
                depth -= 1;
                if in_code && depth == 0 {
                    end = i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    (end > 0).then(|| tail[..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_fence() {
        let reply = "Here is the code:\n```reflexscript\nreflex filter {\n  state x: f32 [m];\n}\n```\nDone.";
        let code = extract_candidate(reply).unwrap();
        assert_eq!(code, "reflex filter {\n  state x: f32 [m];\n}");
    }

    #[test]
    fn test_tagged_fence_beats_keyword_scan() {
        let reply = "reflex stray { }\n```reflexscript\nreflex real { state y: f32 [s]; }\n```";
        let code = extract_candidate(reply).unwrap();
        assert_eq!(code, "reflex real { state y: f32 [s]; }");
    }

    #[test]
    fn test_tagged_fence_trailing_spaces_on_opener() {
        let reply = "```reflexscript   \nreflex f {}\n```";
        assert_eq!(extract_candidate(reply).unwrap(), "reflex f {}");
    }

    #[test]
    fn test_tagged_fence_empty_yields_none() {
        let reply = "```reflexscript\n\n```";
        assert!(extract_candidate(reply).is_none());
    }

    #[test]
    fn test_generic_fence_with_keyword() {
        let reply = "```\nreflex estimator {\n  input u: f32 [mps];\n}\n```";
        let code = extract_candidate(reply).unwrap();
        assert!(code.starts_with("reflex estimator"));
    }

    #[test]
    fn test_generic_fence_prose_rejected() {
        let reply = "```\njust a shell transcript\n$ ls\n```";
        assert!(extract_candidate(reply).is_none());
    }

    #[test]
    fn test_generic_fence_prose_falls_through_to_keyword_scan() {
        let reply = "```\nsome notes\n```\nreflex fallback { state z: f32 [m]; }";
        let code = extract_candidate(reply).unwrap();
        assert_eq!(code, "reflex fallback { state z: f32 [m]; }");
    }

    #[test]
    fn test_keyword_span_nested_braces() {
        let reply = "The program is reflex pid {\n  update {\n    x = x + 1.0;\n  }\n} and that is all.";
        let code = extract_candidate(reply).unwrap();
        assert!(code.starts_with("reflex pid {"));
        assert!(code.ends_with('}'));
        assert!(!code.contains("that is all"));
    }

    #[test]
    fn test_keyword_span_unbalanced_braces() {
        let reply = "reflex broken {\n  update {\n";
        assert!(extract_candidate(reply).is_none());
    }

    #[test]
    fn test_keyword_span_no_braces() {
        let reply = "we should use reflex actions here";
        assert!(extract_candidate(reply).is_none());
    }

    #[test]
    fn test_no_candidate_in_prose() {
        let reply = "I need more detail about the sensor layout before writing code.";
        assert!(extract_candidate(reply).is_none());
    }

    #[test]
    fn test_first_tagged_fence_wins() {
        let reply = "```reflexscript\nreflex one {}\n```\ntext\n```reflexscript\nreflex two {}\n```";
        assert_eq!(extract_candidate(reply).unwrap(), "reflex one {}");
    }

    #[test]
    fn test_unterminated_tagged_fence() {
        let reply = "```reflexscript\nreflex f {}";
        // no closing fence anywhere, so the fence strategies fail and the
        // keyword scan picks up the block
        assert_eq!(extract_candidate(reply).unwrap(), "reflex f {}");
    }

    #[test]
    fn test_result_is_trimmed() {
        let reply = "```reflexscript\n\n  reflex f {}\n\n```";
        assert_eq!(extract_candidate(reply).unwrap(), "reflex f {}");
    }

    #[test]
    fn test_inner_newlines_preserved() {
        let reply = "```reflexscript\nreflex a {\n\n  state q: f32 [kg];\n}\n```";
        let code = extract_candidate(reply).unwrap();
        assert!(code.contains("{\n\n  state"));
    }
}
