//! Custom-property fallback resolution for vector payloads.
//!
//! The executor's vector importer does not resolve CSS custom properties, so
//! every `var(--name, fallback)` reference embedded in a captured payload is
//! replaced by its literal fallback text before the payload crosses the
//! relay. Resolution repeats until a full pass makes no replacement, so a
//! fallback that itself contains a nested `var(...)` reference fully
//! resolves; a second application after convergence is a no-op.

// ============================================================================
// Resolution
// ============================================================================

/// Replaces every `var(--name, fallback)` reference with its literal
/// fallback text, repeating until no replacement occurs.
///
/// A reference with no fallback resolves to empty text. The scan is
/// balanced-paren aware, so fallbacks containing nested function calls stay
/// intact. Total over arbitrary input; unterminated references are left
/// as-is.
#[must_use]
pub fn resolve_var_fallbacks(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let (next, replaced) = resolve_pass(&current);
        if !replaced {
            return next;
        }
        current = next;
    }
}

/// One full replacement pass. Returns the rewritten text and whether any
/// reference was replaced.
fn resolve_pass(input: &str) -> (String, bool) {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut replaced = false;

    while let Some(start) = rest.find("var(") {
        let body_start = start + "var(".len();
        let Some(body_len) = balanced_len(&rest[body_start..]) else {
            // Unterminated reference: keep the text as written.
            out.push_str(&rest[..body_start]);
            rest = &rest[body_start..];
            continue;
        };

        out.push_str(&rest[..start]);
        let body = &rest[body_start..body_start + body_len];
        out.push_str(fallback_of(body));
        replaced = true;
        rest = &rest[body_start + body_len + 1..];
    }

    out.push_str(rest);
    (out, replaced)
}

/// Length of the argument body up to the matching close paren, or `None`
/// when the reference never closes.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Fallback text of a `var()` body: everything after the first top-level
/// comma, trimmed; empty when the reference has no fallback.
fn fallback_of(body: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return body[i + 1..].trim(),
            _ => {}
        }
    }
    ""
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_simple_fallback() {
        assert_eq!(resolve_var_fallbacks("var(--c, red)"), "red");
    }

    #[test]
    fn test_nested_fallback() {
        assert_eq!(resolve_var_fallbacks("var(--a, var(--b, blue))"), "blue");
    }

    #[test]
    fn test_no_fallback_resolves_empty() {
        assert_eq!(resolve_var_fallbacks("fill: var(--stroke);"), "fill: ;");
    }

    #[test]
    fn test_surrounding_text_preserved() {
        assert_eq!(
            resolve_var_fallbacks("stroke: var(--edge, #ff0080); width: 2px"),
            "stroke: #ff0080; width: 2px"
        );
    }

    #[test]
    fn test_multiple_references() {
        assert_eq!(
            resolve_var_fallbacks("var(--a, 1px) var(--b, 2px)"),
            "1px 2px"
        );
    }

    #[test]
    fn test_fallback_with_nested_function() {
        assert_eq!(
            resolve_var_fallbacks("var(--c, rgb(1, 2, 3))"),
            "rgb(1, 2, 3)"
        );
    }

    #[test]
    fn test_no_references_untouched() {
        let svg = "<svg><path d=\"M0 0 L10 10\" fill=\"#333\"/></svg>";
        assert_eq!(resolve_var_fallbacks(svg), svg);
    }

    #[test]
    fn test_unterminated_reference_left_as_is() {
        assert_eq!(resolve_var_fallbacks("var(--broken"), "var(--broken");
    }

    #[test]
    fn test_idempotent() {
        let once = resolve_var_fallbacks("var(--a, var(--b, var(--c, blue)))");
        assert_eq!(once, "blue");
        assert_eq!(resolve_var_fallbacks(&once), once);
    }

    proptest! {
        // Resolution converges: applying it twice never changes the result.
        #[test]
        fn prop_idempotent(input in ".{0,120}") {
            let once = resolve_var_fallbacks(&input);
            let twice = resolve_var_fallbacks(&once);
            prop_assert_eq!(once, twice);
        }

        // Text without references always comes back untouched.
        #[test]
        fn prop_reference_free_is_identity(input in "[a-z0-9 :;#.-]{0,120}") {
            prop_assume!(!input.contains("var("));
            prop_assert_eq!(resolve_var_fallbacks(&input), input);
        }
    }
}
